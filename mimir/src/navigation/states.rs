use std::f32::consts::FRAC_PI_4;

use norn::{Frame, Transition};

use super::{MovementMode, NavContext, NavState, NavigationGoal, Walker};

type Next = Transition<NavState>;

/// One of the four directions the robot walks in while moving orthogonally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Sector {
    Forward,
    Left,
    Right,
    Backward,
}

impl Sector {
    /// The sector containing `bearing`.
    ///
    /// Bearings of exactly 45 degrees are forward and bearings of exactly 135 degrees are
    /// sideways.
    pub(super) fn from_bearing(bearing: f32) -> Self {
        let magnitude = bearing.abs();
        if magnitude <= FRAC_PI_4 {
            Sector::Forward
        } else if magnitude <= 3.0 * FRAC_PI_4 {
            if bearing > 0.0 {
                Sector::Left
            } else {
                Sector::Right
            }
        } else {
            Sector::Backward
        }
    }

    pub(super) fn state(self) -> NavState {
        match self {
            Sector::Forward => NavState::OrthoForward,
            Sector::Left => NavState::OrthoLeftStrafe,
            Sector::Right => NavState::OrthoRightStrafe,
            Sector::Backward => NavState::OrthoBackward,
        }
    }

    fn of_state(state: NavState) -> Option<Self> {
        match state {
            NavState::OrthoForward => Some(Sector::Forward),
            NavState::OrthoLeftStrafe => Some(Sector::Left),
            NavState::OrthoRightStrafe => Some(Sector::Right),
            NavState::OrthoBackward => Some(Sector::Backward),
            _ => None,
        }
    }
}

/// The state to end in once the destination has been reached.
fn arrival(goal: &NavigationGoal) -> NavState {
    if goal.target.rotation.is_some() {
        NavState::SpinToFinalHeading
    } else {
        NavState::Stop
    }
}

/// Proportional turn velocity that corrects `heading_error` while walking.
fn correction(heading_error: f32, context: &NavContext<'_>) -> f32 {
    let config = context.config;
    (heading_error * config.walk_turn_gain).clamp(-config.spin_speed, config.spin_speed)
}

/// Turn velocity of a spin on the spot that reduces `heading_error`.
fn spin_turn(walker: &mut Walker, heading_error: f32, context: &NavContext<'_>) -> f32 {
    let config = context.config;
    let spin = walker.spin_direction(heading_error, config);
    spin.sign() * config.spin_speed * config.rotation_scale(heading_error)
}

pub(super) fn spin_to_walk_heading(
    walker: &mut Walker,
    frame: &Frame<NavState>,
    context: &NavContext<'_>,
) -> Next {
    let Some(goal) = walker.goal else {
        return Transition::SwitchNow(NavState::Stop);
    };

    let heading = context.heading_towards(&goal.target.position);
    let error = context.pose.heading_error(heading);

    if frame.first_frame {
        walker.stop_walking();
        walker.no_walk_set = true;
        walker.sure = 0;
        walker.reset_spin(error);
    }

    if context.at_destination_closer(&goal.target.position) {
        return Transition::SwitchDeferred(arrival(&goal));
    }

    // let the previous walk come to a halt before spinning
    if walker.no_walk_set && context.motion.walk_active {
        return Transition::Stay;
    }

    let turn = spin_turn(walker, error, context);
    walker.send_walk(0.0, 0.0, turn);
    walker.no_walk_set = false;

    let sure = Walker::sure(&mut walker.sure, context.at_heading(heading));
    Transition::later_if(sure > context.config.goto_sure_thresh, NavState::WalkToPoint)
}

pub(super) fn walk_to_point(
    walker: &mut Walker,
    frame: &Frame<NavState>,
    context: &NavContext<'_>,
) -> Next {
    let Some(goal) = walker.goal else {
        return Transition::SwitchNow(NavState::Stop);
    };
    let config = context.config;

    if frame.first_frame {
        walker.stop_walking();
        walker.no_walk_set = true;
        walker.sure = 0;
        walker.sure_other = 0;
    }

    if walker.no_walk_set && context.motion.walk_active {
        return Transition::Stay;
    }

    if Walker::sure(
        &mut walker.sure,
        context.at_destination(&goal.target.position),
    ) > config.goto_sure_thresh
    {
        return Transition::SwitchDeferred(arrival(&goal));
    }

    let heading = context.heading_towards(&goal.target.position);
    if Walker::sure(&mut walker.sure_other, context.not_at_heading(heading))
        > config.goto_sure_thresh
    {
        return Transition::SwitchDeferred(NavState::SpinToWalkHeading);
    }

    let turn = correction(context.pose.heading_error(heading), context);
    walker.send_walk(config.forward_speed, 0.0, turn);
    walker.no_walk_set = false;

    Transition::Stay
}

pub(super) fn spin_to_final_heading(
    walker: &mut Walker,
    frame: &Frame<NavState>,
    context: &NavContext<'_>,
) -> Next {
    let Some(goal) = walker.goal else {
        return Transition::SwitchNow(NavState::Stop);
    };
    let Some(heading) = goal.target.rotation else {
        return Transition::SwitchNow(NavState::Stop);
    };
    let config = context.config;
    let error = context.pose.heading_error(heading);

    if frame.first_frame {
        walker.sure = 0;
        walker.sure_other = 0;
        walker.reset_spin(error);
    }

    let ortho = goal.mode == MovementMode::Orthogonal;
    let pushed_away = !ortho && !context.at_destination(&goal.target.position);
    if Walker::sure(&mut walker.sure_other, pushed_away) > config.goto_sure_thresh {
        return Transition::SwitchDeferred(goal.mode.entry());
    }

    let turn = spin_turn(walker, error, context);
    walker.send_walk(0.0, 0.0, turn);

    if Walker::sure(&mut walker.sure, context.at_heading(heading)) <= config.goto_sure_thresh {
        return Transition::Stay;
    }

    // orthogonal walks turn on the spot whenever they drift off their heading
    if ortho && !context.at_destination(&goal.target.position) {
        Transition::SwitchDeferred(NavState::OrthoWalkToPoint)
    } else {
        Transition::SwitchDeferred(NavState::Stop)
    }
}

pub(super) fn ortho_walk_to_point(
    walker: &mut Walker,
    _: &Frame<NavState>,
    context: &NavContext<'_>,
) -> Next {
    let Some(goal) = walker.goal else {
        return Transition::SwitchNow(NavState::Stop);
    };

    if context.at_destination(&goal.target.position) {
        return Transition::SwitchNow(arrival(&goal));
    }

    let bearing = context.pose.angle_to(&goal.target.position);
    Transition::SwitchNow(Sector::from_bearing(bearing).state())
}

/// Handler of the four orthogonal walking states.
///
/// The robot only translates, it hands over to [`NavState::SpinToFinalHeading`] once it is
/// clearly off the heading of the destination.
pub(super) fn ortho_sector(
    walker: &mut Walker,
    frame: &Frame<NavState>,
    context: &NavContext<'_>,
) -> Next {
    let Some(goal) = walker.goal else {
        return Transition::SwitchNow(NavState::Stop);
    };
    let Some(sector) = Sector::of_state(frame.state) else {
        return Transition::SwitchNow(NavState::OrthoWalkToPoint);
    };
    let config = context.config;

    if frame.first_frame {
        walker.sure = 0;
        walker.sure_other = 0;
        walker.switch_ortho = 0;
    }

    let off_heading = goal
        .target
        .rotation
        .is_some_and(|heading| context.not_at_heading(heading));
    if Walker::sure(&mut walker.sure_other, off_heading) > config.goto_sure_thresh {
        return Transition::SwitchDeferred(NavState::SpinToFinalHeading);
    }

    if Walker::sure(
        &mut walker.sure,
        context.at_destination(&goal.target.position),
    ) > config.goto_sure_thresh
    {
        return Transition::SwitchDeferred(arrival(&goal));
    }

    let bearing = context.pose.angle_to(&goal.target.position);
    if Walker::sure(
        &mut walker.switch_ortho,
        Sector::from_bearing(bearing) != sector,
    ) > config.goto_sure_thresh
    {
        return Transition::SwitchDeferred(NavState::OrthoWalkToPoint);
    }

    match sector {
        Sector::Forward => walker.send_walk(config.forward_speed, 0.0, 0.0),
        Sector::Backward => walker.send_walk(config.backward_speed, 0.0, 0.0),
        Sector::Left => walker.send_walk(0.0, config.strafe_speed, 0.0),
        Sector::Right => walker.send_walk(0.0, -config.strafe_speed, 0.0),
    }

    Transition::Stay
}

pub(super) fn omni_walk_to_point(
    walker: &mut Walker,
    frame: &Frame<NavState>,
    context: &NavContext<'_>,
) -> Next {
    let Some(goal) = walker.goal else {
        return Transition::SwitchNow(NavState::Stop);
    };
    let config = context.config;

    if frame.first_frame {
        walker.sure = 0;
    }

    let position = goal.target.position;
    let heading = goal
        .target
        .rotation
        .unwrap_or_else(|| context.heading_towards(&position));
    let arrived = context.at_destination(&position);

    if Walker::sure(&mut walker.sure, arrived && context.at_heading(heading))
        > config.goto_sure_thresh
    {
        return Transition::SwitchDeferred(NavState::Stop);
    }

    let (forward, left) = if arrived {
        (0.0, 0.0)
    } else {
        let relative = context.pose.world_to_robot(&position);
        (
            (relative.x * config.omni_gain).clamp(config.backward_speed, config.forward_speed),
            (relative.y * config.omni_gain).clamp(-config.strafe_speed, config.strafe_speed),
        )
    };
    let turn = correction(context.pose.heading_error(heading), context);
    walker.send_walk(forward, left, turn);

    Transition::Stay
}

pub(super) fn walking(walker: &mut Walker, frame: &Frame<NavState>, _: &NavContext<'_>) -> Next {
    if frame.first_frame {
        let request = walker.requested;
        walker.send_walk(request.forward, request.left, request.turn);
    }

    Transition::Stay
}

pub(super) fn stepping(
    walker: &mut Walker,
    frame: &Frame<NavState>,
    context: &NavContext<'_>,
) -> Next {
    if frame.first_frame {
        walker.send_steps();
        return Transition::Stay;
    }

    Transition::now_if(!context.motion.walk_active, NavState::Stopped)
}

pub(super) fn stop(walker: &mut Walker, frame: &Frame<NavState>, context: &NavContext<'_>) -> Next {
    if frame.first_frame && (context.motion.walk_active || !walker.walk.is_zero()) {
        walker.stop_walking();
    }

    Transition::now_if(!context.motion.walk_active, NavState::Stopped)
}

pub(super) fn stopped(_: &mut Walker, _: &Frame<NavState>, _: &NavContext<'_>) -> Next {
    Transition::Stay
}
