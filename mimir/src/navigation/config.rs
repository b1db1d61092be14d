use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{Config, angle::degrees};

/// Tolerances, speeds and gains of the navigator.
///
/// Angles are stored in degrees and used in radians, distances are in metres and speeds in
/// metres or radians per second.
///
/// The defaults were tuned for one particular walking engine, measure them again
/// before playing on other hardware.
#[derive(Resource, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NavigatorConfig {
    /// Distance at which the robot is at its destination.
    pub close_enough_xy: f32,
    /// Distance at which the robot is close to its destination while spinning towards it.
    pub closer_xy: f32,
    /// Heading error at which the robot is at its target heading.
    #[serde(with = "degrees")]
    pub close_enough_heading: f32,
    /// Heading error beyond which the robot is no longer at its target heading.
    #[serde(with = "degrees")]
    pub almost_close_enough_heading: f32,
    /// Localization uncertainty above which heading based decisions are suppressed.
    pub max_loc_uncertainty: f32,

    /// Heading error up to which the near rotation scale applies.
    #[serde(with = "degrees")]
    pub heading_near: f32,
    /// Heading error up to which the medium rotation scale applies.
    #[serde(with = "degrees")]
    pub heading_medium: f32,
    pub near_rotation_scale: f32,
    pub medium_rotation_scale: f32,
    pub far_rotation_scale: f32,

    /// Smallest change of forward velocity that is sent to the walking engine.
    pub forward_epsilon: f32,
    /// Smallest change of sideways velocity that is sent to the walking engine.
    pub strafe_epsilon: f32,
    /// Smallest change of turn velocity that is sent to the walking engine.
    #[serde(with = "degrees")]
    pub spin_epsilon: f32,

    pub forward_speed: f32,
    pub backward_speed: f32,
    pub strafe_speed: f32,
    #[serde(with = "degrees")]
    pub spin_speed: f32,
    /// Turn velocity per radian of heading error while walking.
    pub walk_turn_gain: f32,
    /// Velocity per metre of distance to the destination in omnidirectional mode.
    pub omni_gain: f32,

    /// Frames a condition has to hold before the navigator acts on it.
    pub goto_sure_thresh: u32,
    /// Frames a new spin direction has to be preferred before the robot changes direction.
    pub change_spin_dir_thresh: u32,
}

impl Config for NavigatorConfig {
    const PATH: &'static str = "navigator.toml";
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            close_enough_xy: 0.25,
            closer_xy: 0.10,
            close_enough_heading: 25.0_f32.to_radians(),
            almost_close_enough_heading: 45.0_f32.to_radians(),
            max_loc_uncertainty: 0.4,
            heading_near: 10.0_f32.to_radians(),
            heading_medium: 30.0_f32.to_radians(),
            near_rotation_scale: 0.3,
            medium_rotation_scale: 0.6,
            far_rotation_scale: 1.0,
            forward_epsilon: 0.003,
            strafe_epsilon: 0.005,
            spin_epsilon: 2.0_f32.to_radians(),
            forward_speed: 0.04,
            backward_speed: -0.02,
            strafe_speed: 0.02,
            spin_speed: 10.0_f32.to_radians(),
            walk_turn_gain: 0.5,
            omni_gain: 0.5,
            goto_sure_thresh: 5,
            change_spin_dir_thresh: 3,
        }
    }
}

impl NavigatorConfig {
    /// Scale of the turn velocity for the given heading error.
    #[must_use]
    pub fn rotation_scale(&self, heading_error: f32) -> f32 {
        let error = heading_error.abs();
        if error <= self.heading_near {
            self.near_rotation_scale
        } else if error <= self.heading_medium {
            self.medium_rotation_scale
        } else {
            self.far_rotation_scale
        }
    }
}
