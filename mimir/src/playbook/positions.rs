use nalgebra::{Point2, Vector2, point, vector};

use crate::navigation::Target;

use super::{StrategyContext, roles::SubRole};

/// The place on the field a robot in `sub_role` should be.
#[must_use]
pub fn position(sub_role: SubRole, player_number: u8, context: &StrategyContext<'_>) -> Target {
    use SubRole as S;

    let field = &context.layout.field;
    let positions = &context.config.positions;
    let ball = context.ball.field;

    match sub_role {
        S::Init | S::Penalty => Target::new(
            context.pose.world_position(),
            Some(context.pose.world_rotation()),
        ),
        S::ChaseNormal | S::KickoffStriker | S::GoalieChaser => {
            Target::new(ball, facing(ball, field.opponent_goal()))
        }
        S::ChaseAroundBox => {
            let box_front = field.own_goal().x + field.penalty_area_length;
            let position = point![ball.x.max(box_front), ball.y];
            Target::new(position, facing(position, field.opponent_goal()))
        }
        S::Stopper => facing_ball(
            between_ball_and_goal(context, positions.defender_ball_dist),
            ball,
        ),
        S::DeepStopper => facing_ball(
            between_ball_and_goal(context, 2.0 * positions.defender_ball_dist),
            ball,
        ),
        S::Sweeper => {
            let half_goal = field.goal_width / 2.0;
            facing_ball(
                point![positions.sweeper_x, ball.y.clamp(-half_goal, half_goal)],
                ball,
            )
        }
        S::KickoffSweeper => Target::new(point![positions.sweeper_x, 0.0], Some(0.0)),
        S::LeftDeepBack => facing_ball(
            point![positions.deep_back_x, positions.deep_back_y],
            ball,
        ),
        S::RightDeepBack => facing_ball(
            point![positions.deep_back_x, -positions.deep_back_y],
            ball,
        ),
        S::LeftWing | S::RightWing => {
            let side = if sub_role == S::LeftWing { 1.0 } else { -1.0 };
            let x = (ball.x + positions.wing_x_offset)
                .clamp(positions.wing_min_x, positions.wing_max_x);
            facing_ball(point![x, side * positions.wing_y], ball)
        }
        S::DubDOffender => facing_ball(point![positions.dub_d_offender_x, 0.0], ball),
        S::ReadyOffender | S::ReadyDefender | S::ReadyChaser => context
            .layout
            .ready_position(player_number, context.our_kick_off)
            .map_or_else(
                || position(S::Init, player_number, context),
                |pose| {
                    Target::new(
                        pose.translation.vector.into(),
                        Some(pose.rotation.angle()),
                    )
                },
            ),
        S::FrontFinder => Target::new(positions.front_finder, None),
        S::LeftFinder => Target::new(positions.left_finder, None),
        S::RightFinder => Target::new(positions.right_finder, None),
        S::OtherFinder => Target::new(positions.other_finder, None),
        S::GoalieNormal => {
            let half_goal = field.goal_width / 2.0;
            let position = point![
                field.own_goal().x + positions.goalie_x_offset,
                ball.y.clamp(-half_goal, half_goal)
            ];
            facing_ball(position, ball)
        }
    }
}

/// Point on the line from the ball to our goal, `distance` away from the ball.
///
/// The point never lies further forward than `stopper_max_x`, it slides back along the same
/// line instead.
fn between_ball_and_goal(context: &StrategyContext<'_>, distance: f32) -> Point2<f32> {
    let field = &context.layout.field;
    let max_x = context.config.positions.stopper_max_x;
    let goal = field.own_goal();
    let ball = context.ball.field;

    let towards_ball = ball - goal;
    let direction = if towards_ball.norm() > f32::EPSILON {
        towards_ball.normalize()
    } else {
        Vector2::x()
    };

    let mut point = ball - direction * distance.min(towards_ball.norm());
    if point.x > max_x {
        point = if direction.x > f32::EPSILON {
            goal + direction * ((max_x - goal.x) / direction.x)
        } else {
            point![max_x, point.y]
        };
    }

    field.clamp(point)
}

fn facing_ball(position: Point2<f32>, ball: Point2<f32>) -> Target {
    Target::new(position, facing(position, ball))
}

/// Heading that looks from `from` to `to`, if they differ.
fn facing(from: Point2<f32>, to: Point2<f32>) -> Option<f32> {
    let offset = to - from;
    (offset.norm_squared() > f32::EPSILON).then(|| offset.y.atan2(offset.x))
}
