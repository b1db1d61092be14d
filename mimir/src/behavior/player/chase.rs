//! Finding the ball and getting in front of it.

use nalgebra::Vector2;
use norn::{Frame, Transition};

use crate::{motion::sequence::MotionSequence, navigation::Target};

use super::{Agent, Next, PlayerContext, PlayerState as P, position::pursue};

fn ball_lost(context: &PlayerContext<'_>) -> bool {
    context.ball.frames_off > context.config.chase.ball_off_thresh
}

fn ball_found(context: &PlayerContext<'_>) -> bool {
    context.ball.frames_on > context.config.chase.ball_on_thresh
}

fn loc_bearing(context: &PlayerContext<'_>) -> f32 {
    context.ball.loc_bearing(context.pose).abs()
}

fn should_approach(context: &PlayerContext<'_>) -> bool {
    context.ball.on && loc_bearing(context) < context.config.chase.approach_bearing
}

fn should_turn(context: &PlayerContext<'_>) -> bool {
    context.ball.on && loc_bearing(context) > context.config.chase.approach_bearing_off
}

fn should_position_for_kick(context: &PlayerContext<'_>) -> bool {
    let config = &context.config.chase;
    context.ball.on
        && loc_bearing(context) < config.pos_kick_bearing
        && context.ball.loc_distance(context.pose) < config.pos_kick_dist
}

/// The ball is close enough to line up for a kick, but it is worth walking closer first.
pub(super) fn should_approach_for_kick(context: &PlayerContext<'_>) -> bool {
    let config = &context.config.chase;
    context.ball.on
        && loc_bearing(context) < config.pos_kick_bearing
        && context.ball.loc_distance(context.pose)
            > config.pos_kick_dist + context.config.kick.pfk_approach_margin
}

/// The ball lies in the kick box in front of the feet.
pub(super) fn should_kick(context: &PlayerContext<'_>) -> bool {
    let kick = &context.config.kick;
    let ball = context.ball.loc_relative(context.pose);

    context.ball.on
        && ball.y.abs() < kick.box_max_y
        && ball.x > kick.box_min_x
        && ball.x < kick.box_max_x
}

pub(super) fn chase(_: &mut Agent, _: &Frame<P>, context: &mut PlayerContext<'_>) -> Next {
    if ball_lost(context) {
        Transition::SwitchNow(P::ScanFindBall)
    } else if context.config.chase.use_loc_chase {
        Transition::SwitchNow(P::ApproachBallWithLoc)
    } else if should_approach(context) {
        Transition::SwitchNow(P::ApproachBall)
    } else if should_kick(context) {
        Transition::SwitchNow(P::WaitBeforeKick)
    } else if context.ball.on {
        Transition::SwitchNow(P::TurnToBall)
    } else {
        Transition::SwitchNow(P::ScanFindBall)
    }
}

/// Stands still while the head scans for the ball.
pub(super) fn scan_find_ball(
    _: &mut Agent,
    frame: &Frame<P>,
    context: &mut PlayerContext<'_>,
) -> Next {
    if frame.first_frame {
        context.navigator.stop();
        context.head.track_ball();
    }

    if ball_found(context) {
        Transition::SwitchDeferred(P::TurnToBall)
    } else if frame.state_time >= context.library.duration(MotionSequence::ScanBall) {
        Transition::SwitchDeferred(P::SpinFindBall)
    } else {
        Transition::Stay
    }
}

/// Spins on the spot towards where the ball was last seen.
pub(super) fn spin_find_ball(
    _: &mut Agent,
    frame: &Frame<P>,
    context: &mut PlayerContext<'_>,
) -> Next {
    if frame.first_frame {
        let speed = context.config.chase.find_spin_speed;
        let turn = speed.copysign(context.ball.loc_bearing(context.pose));
        context.set_speed(0.0, 0.0, turn);
        context.head.track_ball();
    }

    Transition::later_if(ball_found(context), P::TurnToBall)
}

pub(super) fn turn_to_ball(
    _: &mut Agent,
    frame: &Frame<P>,
    context: &mut PlayerContext<'_>,
) -> Next {
    if frame.first_frame {
        context.head.track_ball();
    }

    if should_kick(context) {
        return Transition::SwitchNow(P::WaitBeforeKick);
    } else if should_position_for_kick(context) {
        return Transition::SwitchNow(P::PositionForKick);
    } else if should_approach(context) {
        return Transition::SwitchDeferred(P::ApproachBall);
    } else if ball_lost(context) {
        return Transition::SwitchDeferred(P::ScanFindBall);
    }

    let config = &context.config.chase;
    let turn = (context.ball.bearing() * config.ball_spin_gain)
        .clamp(-config.ball_spin_speed, config.ball_spin_speed);
    // slower turns make the robot step in place
    let turn = if turn.abs() < config.min_ball_spin_speed {
        config.min_ball_spin_speed.copysign(turn)
    } else {
        turn
    };

    if context.ball.on {
        context.set_speed(0.0, 0.0, turn);
    }
    Transition::Stay
}

/// Walks straight at the ball, correcting the heading on the way.
pub(super) fn approach_ball(
    _: &mut Agent,
    frame: &Frame<P>,
    context: &mut PlayerContext<'_>,
) -> Next {
    if frame.first_frame {
        context.head.track_ball();
    }

    if should_kick(context) {
        return Transition::SwitchNow(P::WaitBeforeKick);
    } else if should_position_for_kick(context) {
        return Transition::SwitchNow(P::PositionForKick);
    } else if should_turn(context) {
        return Transition::SwitchDeferred(P::TurnToBall);
    } else if ball_lost(context) {
        return Transition::SwitchDeferred(P::ScanFindBall);
    }

    let config = &context.config.chase;
    let forward = (context.ball.distance() * config.approach_x_gain)
        .clamp(config.approach_min_x_speed, config.approach_max_x_speed);
    let turn = (context.ball.bearing() * config.approach_spin_gain)
        .clamp(-config.approach_spin_speed, config.approach_spin_speed);
    let turn = if turn.abs() < config.min_approach_spin_speed {
        0.0
    } else {
        turn
    };

    if context.ball.on {
        context.set_speed(forward, 0.0, turn);
    }
    Transition::Stay
}

/// Walks to a point behind the ball on the line to the opponent goal, using the filtered ball
/// position.
pub(super) fn approach_ball_with_loc(
    agent: &mut Agent,
    frame: &Frame<P>,
    context: &mut PlayerContext<'_>,
) -> Next {
    if frame.first_frame {
        agent.change_omni = 0;
        context.head.track_ball();
    }

    if should_kick(context) {
        return Transition::SwitchNow(P::WaitBeforeKick);
    } else if should_position_for_kick(context) {
        return Transition::SwitchDeferred(P::PositionForKick);
    } else if ball_lost(context) {
        return Transition::SwitchDeferred(P::ScanFindBall);
    }

    let target = approach_target(context);
    let omni_dist = context.config.chase.approach_omni_dist;
    pursue(agent, context, target, omni_dist);
    Transition::Stay
}

/// The point `behind_ball_dist` behind the ball, facing the opponent goal.
fn approach_target(context: &PlayerContext<'_>) -> Target {
    let ball = context.ball.field;
    let goal = context.layout.field.opponent_goal();

    let towards_goal = goal - ball;
    let direction = if towards_goal.norm() > f32::EPSILON {
        towards_goal.normalize()
    } else {
        Vector2::x()
    };

    Target::new(
        ball - direction * context.config.chase.behind_ball_dist,
        Some(direction.y.atan2(direction.x)),
    )
}

/// Shuffles around the ball until it lies in front of a foot.
pub(super) fn position_for_kick(
    _: &mut Agent,
    _: &Frame<P>,
    context: &mut PlayerContext<'_>,
) -> Next {
    let chase = &context.config.chase;

    if should_kick(context) {
        return Transition::SwitchNow(P::WaitBeforeKick);
    } else if ball_lost(context) {
        return Transition::SwitchDeferred(P::ScanFindBall);
    } else if context.ball.on && loc_bearing(context) > chase.pos_kick_bearing {
        return Transition::SwitchDeferred(P::TurnToBall);
    } else if should_approach_for_kick(context) {
        return Transition::SwitchDeferred(P::ApproachBall);
    }

    let kick = &context.config.kick;
    let ball = context.ball.relative;

    let foot_y = ((kick.foot_inner_y + kick.foot_outer_y) / 2.0).copysign(ball.y);
    let left = ((ball.y - foot_y) * kick.pfk_y_gain)
        .clamp(-kick.pfk_max_y_speed, kick.pfk_max_y_speed);
    let left = if left.abs() < kick.pfk_min_y_magnitude {
        0.0
    } else {
        left
    };

    let box_x = (kick.box_min_x + kick.box_max_x) / 2.0;
    let forward = ((ball.x - box_x) * kick.pfk_x_gain)
        .clamp(-kick.pfk_max_x_speed, kick.pfk_max_x_speed);

    if context.ball.on {
        context.set_speed(forward, left, 0.0);
    }
    Transition::Stay
}

/// Stops, and makes sure the ball is still kickable once the robot stands still.
pub(super) fn wait_before_kick(
    _: &mut Agent,
    frame: &Frame<P>,
    context: &mut PlayerContext<'_>,
) -> Next {
    if frame.first_frame {
        context.navigator.stop();
    }

    if !context.navigator.is_stopped() {
        return Transition::Stay;
    }

    if should_approach_for_kick(context) {
        context.head.track_ball();
        Transition::SwitchDeferred(P::ApproachBall)
    } else if ball_lost(context) {
        context.head.track_ball();
        Transition::SwitchDeferred(P::ScanFindBall)
    } else if !should_kick(context) {
        context.head.track_ball();
        Transition::SwitchDeferred(P::PositionForKick)
    } else {
        Transition::SwitchDeferred(P::DecideKick)
    }
}
