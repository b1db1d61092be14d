use norn::{Frame, Transition};

use crate::primary_state::PrimaryState;

use super::{
    Strategy, StrategyContext, Team, formations,
    roles::{Assignment, Formation},
};

/// The strategy the situation calls for.
pub(super) fn select(team: &Team, context: &StrategyContext<'_>) -> Strategy {
    let config = context.config;

    match context.primary_state {
        PrimaryState::Initial | PrimaryState::Finished => Strategy::Init,
        PrimaryState::Penalized => Strategy::Penalized,
        PrimaryState::Ready | PrimaryState::Set => Strategy::Ready,
        PrimaryState::Playing if config.test_defender => Strategy::TestDefender,
        PrimaryState::Playing if config.test_offender => Strategy::TestOffender,
        PrimaryState::Playing if config.test_chaser => Strategy::TestChaser,
        PrimaryState::Playing if team.is_goalie(config) => Strategy::Goalie,
        PrimaryState::Playing => {
            let in_kickoff = team
                .playing_for(context.now)
                .is_some_and(|playing| playing < config.kickoff_formation_time);

            if context.our_kick_off && in_kickoff {
                Strategy::Kickoff
            } else if team.active_field_players(config).next().is_none() {
                Strategy::NoFieldPlayers
            } else if team.inactive_field_players(config) > 0 {
                Strategy::OneDown
            } else {
                Strategy::Spread
            }
        }
    }
}

/// Switches to the strategy the situation calls for, or lets `formation` make this frame's
/// proposal.
fn play(
    team: &mut Team,
    frame: &Frame<Strategy>,
    context: &StrategyContext<'_>,
    formation: impl FnOnce(&Team, &StrategyContext<'_>) -> Assignment,
) -> Transition<Strategy> {
    let wanted = select(team, context);
    if wanted != frame.state {
        return Transition::SwitchNow(wanted);
    }

    let assignment = formation(team, context);
    team.propose(assignment);
    Transition::Stay
}

pub(super) fn init(
    team: &mut Team,
    frame: &Frame<Strategy>,
    context: &StrategyContext<'_>,
) -> Transition<Strategy> {
    play(team, frame, context, |_, _| formations::init())
}

pub(super) fn penalized(
    team: &mut Team,
    frame: &Frame<Strategy>,
    context: &StrategyContext<'_>,
) -> Transition<Strategy> {
    play(team, frame, context, |_, _| formations::penalty())
}

pub(super) fn ready(
    team: &mut Team,
    frame: &Frame<Strategy>,
    context: &StrategyContext<'_>,
) -> Transition<Strategy> {
    play(team, frame, context, formations::ready)
}

pub(super) fn goalie(
    team: &mut Team,
    frame: &Frame<Strategy>,
    context: &StrategyContext<'_>,
) -> Transition<Strategy> {
    play(team, frame, context, formations::goalie)
}

pub(super) fn kickoff(
    team: &mut Team,
    frame: &Frame<Strategy>,
    context: &StrategyContext<'_>,
) -> Transition<Strategy> {
    play(team, frame, context, formations::kickoff)
}

pub(super) fn spread(
    team: &mut Team,
    frame: &Frame<Strategy>,
    context: &StrategyContext<'_>,
) -> Transition<Strategy> {
    play(team, frame, context, |team, context| {
        formations::field_play(team, context, Formation::Spread)
    })
}

pub(super) fn one_down(
    team: &mut Team,
    frame: &Frame<Strategy>,
    context: &StrategyContext<'_>,
) -> Transition<Strategy> {
    play(team, frame, context, |team, context| {
        formations::field_play(team, context, Formation::OneDown)
    })
}

pub(super) fn no_field_players(
    team: &mut Team,
    frame: &Frame<Strategy>,
    context: &StrategyContext<'_>,
) -> Transition<Strategy> {
    play(team, frame, context, |_, context| {
        formations::no_field_players(context)
    })
}

pub(super) fn test_defender(
    team: &mut Team,
    frame: &Frame<Strategy>,
    context: &StrategyContext<'_>,
) -> Transition<Strategy> {
    play(team, frame, context, |_, context| {
        Assignment::new(Formation::TestDefend, formations::defender(context))
    })
}

pub(super) fn test_offender(
    team: &mut Team,
    frame: &Frame<Strategy>,
    context: &StrategyContext<'_>,
) -> Transition<Strategy> {
    play(team, frame, context, |_, context| {
        Assignment::new(Formation::TestOffend, formations::offender(context))
    })
}

pub(super) fn test_chaser(
    team: &mut Team,
    frame: &Frame<Strategy>,
    context: &StrategyContext<'_>,
) -> Transition<Strategy> {
    play(team, frame, context, |_, context| {
        Assignment::new(Formation::TestChase, formations::chaser(context))
    })
}
