use bevy::prelude::*;

use crate::game_controller::{GamePhase, GameSignal};

/// Plugin providing information about the primary state of the robot. These
/// states include: "Initial", "Ready", "Set", "Playing", "Penalized" and "Finished".
///
/// This module provides the following resources to the application:
/// - [`PrimaryState`]
pub struct PrimaryStatePlugin;

impl Plugin for PrimaryStatePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PrimaryState>();

        app.add_systems(PreUpdate, update_primary_state);
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Eq, Copy, Default)]
pub enum PrimaryState {
    /// State at the start of the match where the robots stand still.
    #[default]
    Initial,
    /// State in which robots walk to their legal positions
    Ready,
    /// State in which the robots wait for a kick-off or penalty
    Set,
    /// State in which the robots are playing soccer
    Playing,
    /// State when the robot has been penalized. Robot may not move except for
    /// standing up
    Penalized,
    /// State of the robot when a half is finished
    Finished,
}

pub fn update_primary_state(mut primary_state: ResMut<PrimaryState>, signal: Res<GameSignal>) {
    let next_state = next_primary_state(&signal);

    if *primary_state != next_state {
        tracing::info!("primary state: {:?} -> {next_state:?}", *primary_state);
        *primary_state = next_state;
    }
}

#[must_use]
pub fn next_primary_state(signal: &GameSignal) -> PrimaryState {
    use PrimaryState as PS;

    if signal.penalized && signal.phase != GamePhase::Finished {
        return PS::Penalized;
    }

    match signal.phase {
        GamePhase::Initial => PS::Initial,
        GamePhase::Ready => PS::Ready,
        GamePhase::Set => PS::Set,
        GamePhase::Playing => PS::Playing,
        GamePhase::Finished => PS::Finished,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn penalty_overrides_phase() {
        let signal = GameSignal {
            phase: GamePhase::Playing,
            penalized: true,
            our_kick_off: false,
        };

        assert_eq!(next_primary_state(&signal), PrimaryState::Penalized);
    }

    #[test]
    fn finished_is_never_penalized() {
        let signal = GameSignal {
            phase: GamePhase::Finished,
            penalized: true,
            our_kick_off: false,
        };

        assert_eq!(next_primary_state(&signal), PrimaryState::Finished);
    }
}
