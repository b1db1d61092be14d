//! The match state as signalled by the game controller.

use bevy::prelude::*;

/// Plugin providing the [`GameSignal`] resource, which is written by the game controller
/// receiver.
pub struct GameControllerPlugin;

impl Plugin for GameControllerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameSignal>();
    }
}

/// Phase of the match.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    #[default]
    Initial,
    Ready,
    Set,
    Playing,
    Finished,
}

/// Latest match state received from the game controller.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GameSignal {
    pub phase: GamePhase,
    /// Whether this robot is currently penalized.
    pub penalized: bool,
    /// Whether our team takes the kick-off.
    pub our_kick_off: bool,
}
