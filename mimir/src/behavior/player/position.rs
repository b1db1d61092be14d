use norn::{Frame, Transition};

use crate::{
    navigation::{MovementMode, Target},
    primary_state::PrimaryState,
};

use super::{Agent, Next, PlayerContext, PlayerState as P};

/// Walks to `target`, omnidirectionally once it is within `omni_dist`.
///
/// The movement mode only changes after the other one has been preferred for more than
/// `change_omni_thresh` frames in a row.
pub(super) fn pursue(
    agent: &mut Agent,
    context: &mut PlayerContext<'_>,
    target: Target,
    omni_dist: f32,
) {
    let use_omni = context.pose.distance_to(&target.position) <= omni_dist;
    let mode = context.navigator.movement_mode();
    let moving_omni = mode == Some(MovementMode::Omni);

    if use_omni == moving_omni {
        agent.change_omni = 0;
    } else {
        agent.change_omni += 1;
    }

    let omni = match mode {
        Some(_) if agent.change_omni <= context.config.position.change_omni_thresh => moving_omni,
        _ => use_omni,
    };
    if omni {
        context.navigator.omni_go_to(target);
    } else {
        context.navigator.go_to(target);
    }
}

/// Walks to the position of the current sub-role.
pub(super) fn playbook_position(
    agent: &mut Agent,
    frame: &Frame<P>,
    context: &mut PlayerContext<'_>,
) -> Next {
    if frame.first_frame {
        agent.change_omni = 0;
        if context.primary_state == PrimaryState::Ready {
            context.head.loc_pans();
        } else {
            context.head.track_ball();
        }
    }

    let target = context.arbiter.my_position();
    let omni_dist = context.config.position.omni_dist;
    pursue(agent, context, target, omni_dist);

    Transition::later_if(
        context.navigator.is_stopped() && frame.counter > 0,
        P::AtPosition,
    )
}

/// Stands at the position until the robot has clearly been off it for a while.
pub(super) fn at_position(
    agent: &mut Agent,
    frame: &Frame<P>,
    context: &mut PlayerContext<'_>,
) -> Next {
    if frame.first_frame {
        agent.not_at_position = 0;
        context.navigator.stop();
    }

    let target = context.arbiter.my_position();
    let nav = context.nav();
    let off_position = !nav.at_destination(&target.position)
        || target
            .rotation
            .is_some_and(|heading| nav.not_at_heading(heading));

    if off_position {
        agent.not_at_position += 1;
    } else {
        agent.not_at_position = 0;
    }

    Transition::later_if(
        agent.not_at_position > context.config.position.not_at_position_thresh
            && nav.localized(),
        P::PlaybookPosition,
    )
}
