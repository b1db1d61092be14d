//! The behaviors that run every cycle, and the order they run in.

pub mod behavior_config;
mod fall;
mod head;
mod player;

use bevy::{app::PluginGroupBuilder, prelude::*};

use crate::{
    navigation::NavigatorPlugin, playbook::PlaybookPlugin, primary_state::PrimaryStatePlugin,
};

pub use behavior_config::BehaviorConfig;
pub use fall::{FallContext, FallMonitor, FallState};
pub use head::{HeadContext, HeadState, HeadTracker};
pub use player::{BallFoot, Player, PlayerContext, PlayerState};

/// A collection of plugins related to behaviors.
pub struct BehaviorPlugins;

impl PluginGroup for BehaviorPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>()
            .add(BehaviorSetPlugin)
            .add(PrimaryStatePlugin)
            .add(fall::FallPlugin)
            .add(PlaybookPlugin)
            .add(player::PlayerPlugin)
            .add(head::HeadPlugin)
            .add(NavigatorPlugin)
    }
}

/// The stages of a cycle in [`Update`], each behavior sees what the ones before it decided in
/// the same cycle.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorSet {
    Fall,
    Playbook,
    Player,
    Head,
    Navigation,
    /// Commands are handed to the motion engine.
    Dispatch,
}

struct BehaviorSetPlugin;

impl Plugin for BehaviorSetPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                BehaviorSet::Fall,
                BehaviorSet::Playbook,
                BehaviorSet::Player,
                BehaviorSet::Head,
                BehaviorSet::Navigation,
                BehaviorSet::Dispatch,
            )
                .chain(),
        );
    }
}
