//! The assignment of sub-roles within each formation.

use itertools::Itertools;

use super::{
    StrategyContext, Team, Teammate,
    positions::position,
    roles::{Assignment, Formation, SubRole},
};

pub(super) fn init() -> Assignment {
    Assignment::new(Formation::Init, SubRole::Init)
}

pub(super) fn penalty() -> Assignment {
    Assignment::new(Formation::Penalty, SubRole::Penalty)
}

pub(super) fn ready(team: &Team, context: &StrategyContext<'_>) -> Assignment {
    let config = context.config;
    let me = team.me().number;

    let sub_role = if team.is_goalie(config) {
        SubRole::GoalieNormal
    } else if me == config.kickoff_striker_number
        || team.active_field_players(config).next().is_none()
    {
        SubRole::ReadyChaser
    } else if me == config.kickoff_sweeper_number {
        SubRole::ReadyDefender
    } else {
        SubRole::ReadyOffender
    };

    Assignment::new(Formation::Ready, sub_role)
}

pub(super) fn goalie(_team: &Team, context: &StrategyContext<'_>) -> Assignment {
    let sub_role = if context.layout.field.in_own_goal_box(&context.ball.field) {
        SubRole::GoalieChaser
    } else {
        SubRole::GoalieNormal
    };

    Assignment::new(Formation::Goalie, sub_role)
}

pub(super) fn kickoff(team: &Team, context: &StrategyContext<'_>) -> Assignment {
    let config = context.config;
    let formation = if team.inactive_field_players(config) > 0 {
        Formation::OneKickoff
    } else {
        Formation::Kickoff
    };

    let chaser = team.determine_chaser(config);
    let sub_role = if chaser == team.me().number {
        SubRole::KickoffStriker
    } else {
        assign(
            team,
            context,
            Some(chaser),
            &[SubRole::KickoffSweeper, offender(context)],
        )
    };

    Assignment::new(formation, sub_role)
}

/// The formations of regular play, with `formation` being [`Formation::Spread`] or
/// [`Formation::OneDown`].
pub(super) fn field_play(
    team: &Team,
    context: &StrategyContext<'_>,
    formation: Formation,
) -> Assignment {
    let config = context.config;

    if team.goalie_active(config) && context.layout.field.in_own_goal_box(&context.ball.field) {
        return dub_d(team, context);
    }
    if team.ball_unseen_for(context.now) > config.finder_time {
        return finder(team, context);
    }

    let chaser = team.determine_chaser(config);
    let sub_role = if chaser == team.me().number {
        self::chaser(context)
    } else {
        assign(
            team,
            context,
            Some(chaser),
            &[
                defender(context),
                offender(context),
                SubRole::DeepStopper,
                SubRole::LeftDeepBack,
                SubRole::RightDeepBack,
            ],
        )
    };

    Assignment::new(formation, sub_role)
}

pub(super) fn no_field_players(context: &StrategyContext<'_>) -> Assignment {
    Assignment::new(Formation::NoFieldPlayers, chaser(context))
}

/// The ball is in our goal box, the goalie takes it and the field players block the way to the
/// goal.
fn dub_d(team: &Team, context: &StrategyContext<'_>) -> Assignment {
    let sub_role = if team.active_field_players(context.config).next().is_none() {
        SubRole::Sweeper
    } else {
        assign(
            team,
            context,
            None,
            &[
                SubRole::LeftDeepBack,
                SubRole::RightDeepBack,
                SubRole::DubDOffender,
            ],
        )
    };

    Assignment::new(Formation::DubD, sub_role)
}

fn finder(team: &Team, context: &StrategyContext<'_>) -> Assignment {
    let sub_role = assign(
        team,
        context,
        None,
        &[
            SubRole::FrontFinder,
            SubRole::LeftFinder,
            SubRole::RightFinder,
            SubRole::OtherFinder,
        ],
    );

    Assignment::new(Formation::Finder, sub_role)
}

pub(super) fn chaser(context: &StrategyContext<'_>) -> SubRole {
    if context.layout.field.in_own_goal_box(&context.ball.field) {
        SubRole::ChaseAroundBox
    } else {
        SubRole::ChaseNormal
    }
}

/// Sweeps in front of the goal when the ball is deep in our half, stops the ball further up
/// otherwise.
pub(super) fn defender(context: &StrategyContext<'_>) -> SubRole {
    let field = &context.layout.field;
    let ball = context.ball.field;

    if ball.x < -field.length / 4.0 && ball.y.abs() <= field.penalty_area_width / 2.0 {
        SubRole::Sweeper
    } else if ball.x < 0.0 {
        SubRole::DeepStopper
    } else {
        SubRole::Stopper
    }
}

/// The wing on the other side of the ball.
pub(super) fn offender(context: &StrategyContext<'_>) -> SubRole {
    if context.ball.field.y >= 0.0 {
        SubRole::RightWing
    } else {
        SubRole::LeftWing
    }
}

/// Picks my sub-role out of `slots`, which are shared among me and the other active field
/// players except `excluded`.
fn assign(
    team: &Team,
    context: &StrategyContext<'_>,
    excluded: Option<u8>,
    slots: &[SubRole],
) -> SubRole {
    let me = team.me().number;
    let mates: Vec<&Teammate> = team
        .active_field_players(context.config)
        .filter(|mate| Some(mate.number) != excluded)
        .collect_vec();

    let slots = &slots[..slots.len().min(mates.len() + 1)];
    let positions = slots
        .iter()
        .map(|slot| position(*slot, me, context).position)
        .collect_vec();

    slots[team.least_weight_position(&positions, &mates)]
}
