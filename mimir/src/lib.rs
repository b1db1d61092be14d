pub mod ball;
pub mod behavior;
pub mod communication;
pub mod config;
pub mod cycle;
pub mod game_controller;
pub mod localization;
pub mod motion;
pub mod navigation;
pub mod playbook;
pub mod primary_state;
pub mod sensor;

use bevy::{app::PluginGroupBuilder, prelude::*};

pub use miette::Result;

/// Plugins providing the resources the decision core shares with the rest of the robot.
///
/// These only make sure the resources exist, the [`behavior::BehaviorPlugins`] read and write
/// them every cycle.
pub struct InterfacePlugins;

impl PluginGroup for InterfacePlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>()
            .add(cycle::CyclePlugin)
            .add(game_controller::GameControllerPlugin)
            .add(localization::LocalizationPlugin)
            .add(ball::BallPlugin)
            .add(sensor::SensorPlugin)
            .add(motion::MotionPlugin)
            .add(communication::CommunicationPlugin)
    }
}

/// The mimir prelude conveniently includes commonly needed types and traits for writing code
/// in the decision core.
pub mod prelude {
    pub use crate::{
        InterfacePlugins, Result,
        behavior::{BehaviorConfig, BehaviorPlugins, BehaviorSet},
        config::{Config, ConfigExt, ConfigPlugin},
        cycle::FrameTime,
    };
    pub use bevy::prelude::*;
}
