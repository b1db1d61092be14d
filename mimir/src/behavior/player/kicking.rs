//! Picking and executing a kick once the ball lies in front of the feet.

use norn::{Frame, Transition};
use tracing::{debug, warn};

use crate::{behavior::behavior_config::KickBehaviorConfig, motion::sequence::MotionSequence};

use super::{Agent, BallFoot, Next, PlayerContext, PlayerState as P};

impl BallFoot {
    /// The foot a ball at sideways offset `y` from the robot lies in front of.
    #[must_use]
    pub fn of(y: f32, config: &KickBehaviorConfig) -> Self {
        let (inner, outer) = (config.foot_inner_y, config.foot_outer_y);

        if (inner..outer).contains(&y) {
            BallFoot::Left
        } else if (0.0..inner).contains(&y) {
            BallFoot::MidLeft
        } else if y < 0.0 && y > -inner {
            BallFoot::MidRight
        } else if y <= -inner && y > -outer {
            BallFoot::Right
        } else {
            BallFoot::Incorrect
        }
    }
}

/// Kicks towards the opponent goal: straight ahead if it lies within `max_forward_kick_angle`,
/// sideways otherwise.
pub(super) fn decide_kick(
    agent: &mut Agent,
    frame: &Frame<P>,
    context: &mut PlayerContext<'_>,
) -> Next {
    if frame.first_frame {
        context.head.track_ball();
    }

    let kick = &context.config.kick;
    if !context.ball.on {
        return Transition::later_if(
            context.ball.frames_off >= kick.decide_lost_ball_frames,
            P::ScanFindBall,
        );
    }

    agent.ball_foot = BallFoot::of(context.ball.relative.y, kick);
    let goal_bearing = context.pose.angle_to(&context.layout.field.opponent_goal());
    debug!(
        foot = %agent.ball_foot,
        goal_bearing = goal_bearing.to_degrees(),
        "deciding kick"
    );

    if goal_bearing > kick.max_forward_kick_angle {
        Transition::SwitchDeferred(P::KickBallLeft)
    } else if goal_bearing < -kick.max_forward_kick_angle {
        Transition::SwitchDeferred(P::KickBallRight)
    } else {
        Transition::SwitchDeferred(P::KickBallStraight)
    }
}

pub(super) fn kick_ball_straight(
    agent: &mut Agent,
    _: &Frame<P>,
    _: &mut PlayerContext<'_>,
) -> Next {
    agent.chosen_kick = match agent.ball_foot {
        BallFoot::Left | BallFoot::MidLeft => Some(MotionSequence::LeftFarKick),
        BallFoot::Right | BallFoot::MidRight => Some(MotionSequence::RightFarKick),
        BallFoot::Incorrect => None,
    };

    match agent.chosen_kick {
        Some(_) => Transition::SwitchNow(P::KickBallExecute),
        None => Transition::SwitchDeferred(P::PositionForKick),
    }
}

/// Kicks the ball to the left with the right foot.
pub(super) fn kick_ball_left(agent: &mut Agent, _: &Frame<P>, _: &mut PlayerContext<'_>) -> Next {
    agent.chosen_kick = Some(MotionSequence::RightSideKick);
    Transition::SwitchNow(P::SideStepForKick)
}

/// Kicks the ball to the right with the left foot.
pub(super) fn kick_ball_right(agent: &mut Agent, _: &Frame<P>, _: &mut PlayerContext<'_>) -> Next {
    agent.chosen_kick = Some(MotionSequence::LeftSideKick);
    Transition::SwitchNow(P::SideStepForKick)
}

/// Side kicks need the ball between the feet, steps towards it if it lies in front of a foot.
pub(super) fn side_step_for_kick(
    agent: &mut Agent,
    _: &Frame<P>,
    _: &mut PlayerContext<'_>,
) -> Next {
    match agent.ball_foot {
        BallFoot::MidLeft | BallFoot::MidRight => Transition::SwitchNow(P::KickBallExecute),
        BallFoot::Left => Transition::SwitchNow(P::StepLeftForKick),
        BallFoot::Right => Transition::SwitchNow(P::StepRightForKick),
        BallFoot::Incorrect => Transition::SwitchDeferred(P::PositionForKick),
    }
}

/// Handles both [`P::StepLeftForKick`] and [`P::StepRightForKick`].
pub(super) fn step_for_kick(
    _: &mut Agent,
    frame: &Frame<P>,
    context: &mut PlayerContext<'_>,
) -> Next {
    if frame.first_frame {
        let kick = &context.config.kick;
        let left = if frame.state == P::StepLeftForKick {
            kick.side_step
        } else {
            -kick.side_step
        };
        let count = kick.side_step_count;

        context.navigator.set_steps(0.0, left, 0.0, count);
        return Transition::Stay;
    }

    Transition::now_if(context.navigator.is_stopped(), P::KickBallExecute)
}

pub(super) fn kick_ball_execute(
    agent: &mut Agent,
    frame: &Frame<P>,
    context: &mut PlayerContext<'_>,
) -> Next {
    let Some(kick) = agent.chosen_kick else {
        warn!("no kick chosen, chasing again");
        return Transition::SwitchDeferred(P::Chase);
    };

    if frame.first_frame {
        context.head.track_ball();
        context.sequences.push(kick);
        return Transition::Stay;
    }

    Transition::later_if(
        frame.state_time >= context.library.duration(kick),
        P::AfterKick,
    )
}

/// Waits for the robot to stand still again after the kick.
pub(super) fn after_kick(
    agent: &mut Agent,
    frame: &Frame<P>,
    context: &mut PlayerContext<'_>,
) -> Next {
    if frame.first_frame {
        agent.chosen_kick = None;
        context.navigator.stop();
    }

    Transition::later_if(context.navigator.is_stopped(), P::Chase)
}
