use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::Config;

/// This config store general information for matches, for example things like
/// team number and player numbers.
#[derive(Resource, Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ShowtimeConfig {
    /// Team number to use during a match
    pub team_number: u8,
    /// This field contains mappings from robot names to player numbers
    pub robot_numbers_map: HashMap<String, u8>,
}

impl Config for ShowtimeConfig {
    const PATH: &'static str = "showtime.toml";
}

impl ShowtimeConfig {
    /// The player configuration of the robot called `robot`.
    #[must_use]
    pub fn player(&self, robot: &str) -> Option<PlayerConfig> {
        self.robot_numbers_map
            .get(robot)
            .map(|&player_number| PlayerConfig {
                player_number,
                team_number: self.team_number,
            })
    }
}

/// This config stores robot specific information for matches, for example
/// things like the robot team and player number.
#[derive(Resource, Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PlayerConfig {
    pub player_number: u8,
    pub team_number: u8,
}
