use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{Config, angle::degrees};

/// Thresholds and gains of the player, the head tracker and the fall monitor.
///
/// Angles are stored in degrees, distances in metres and speeds in metres or degrees per second.
/// The defaults fit the kinematics of the robot they were tuned on.
#[derive(Resource, Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BehaviorConfig {
    pub chase: ChaseBehaviorConfig,
    pub kick: KickBehaviorConfig,
    pub position: PositionBehaviorConfig,
    pub head: HeadConfig,
    pub fall: FallConfig,
}

impl Config for BehaviorConfig {
    const PATH: &'static str = "behavior.toml";
}

/// Getting to the ball.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChaseBehaviorConfig {
    /// Walk to a point behind the ball using the localization instead of following vision.
    pub use_loc_chase: bool,
    /// Frames the ball has to be seen before it counts as found.
    pub ball_on_thresh: u32,
    /// Frames the ball has to be missing before it counts as lost.
    pub ball_off_thresh: u32,

    /// Bearing below which the robot stops turning and walks to the ball.
    #[serde(with = "degrees")]
    pub approach_bearing: f32,
    /// Bearing above which the robot stops walking and turns to the ball.
    #[serde(with = "degrees")]
    pub approach_bearing_off: f32,
    /// Distance below which the robot lines up the ball for a kick.
    pub pos_kick_dist: f32,
    #[serde(with = "degrees")]
    pub pos_kick_bearing: f32,

    #[serde(with = "degrees")]
    pub find_spin_speed: f32,
    #[serde(with = "degrees")]
    pub ball_spin_speed: f32,
    /// Slowest turn towards the ball, slower turns make the robot step in place.
    #[serde(with = "degrees")]
    pub min_ball_spin_speed: f32,
    pub ball_spin_gain: f32,

    pub approach_x_gain: f32,
    pub approach_max_x_speed: f32,
    pub approach_min_x_speed: f32,
    pub approach_spin_gain: f32,
    #[serde(with = "degrees")]
    pub approach_spin_speed: f32,
    /// Turn velocities below this are dropped while approaching.
    #[serde(with = "degrees")]
    pub min_approach_spin_speed: f32,

    /// Distance to the approach point below which the robot walks omnidirectionally.
    pub approach_omni_dist: f32,
    /// Distance of the approach point behind the ball.
    pub behind_ball_dist: f32,
}

impl Default for ChaseBehaviorConfig {
    fn default() -> Self {
        Self {
            use_loc_chase: false,
            ball_on_thresh: 2,
            ball_off_thresh: 12,
            approach_bearing: 10.0_f32.to_radians(),
            approach_bearing_off: 17.0_f32.to_radians(),
            pos_kick_dist: 0.15,
            pos_kick_bearing: 30.0_f32.to_radians(),
            find_spin_speed: 25.0_f32.to_radians(),
            ball_spin_speed: 15.0_f32.to_radians(),
            min_ball_spin_speed: 5.0_f32.to_radians(),
            ball_spin_gain: 0.4,
            approach_x_gain: 0.22,
            approach_max_x_speed: 0.075,
            approach_min_x_speed: -0.075,
            approach_spin_gain: 0.4,
            approach_spin_speed: 10.0_f32.to_radians(),
            min_approach_spin_speed: 3.0_f32.to_radians(),
            approach_omni_dist: 0.5,
            behind_ball_dist: 0.3,
        }
    }
}

/// Lining up and executing a kick.
///
/// Ball positions are relative to the robot, with the kick box in front of the feet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct KickBehaviorConfig {
    pub box_min_x: f32,
    pub box_max_x: f32,
    /// Largest sideways offset of a kickable ball, on either side.
    pub box_max_y: f32,
    /// Sideways offset that separates the middle of the feet from the feet themselves.
    pub foot_inner_y: f32,
    /// Sideways offset beyond which the ball is outside of the feet.
    pub foot_outer_y: f32,

    /// Bearing of the opponent goal beyond which the robot kicks sideways.
    #[serde(with = "degrees")]
    pub max_forward_kick_angle: f32,
    /// Frames the ball may be missing while deciding on a kick.
    pub decide_lost_ball_frames: u32,

    pub pfk_x_gain: f32,
    pub pfk_y_gain: f32,
    pub pfk_max_x_speed: f32,
    pub pfk_max_y_speed: f32,
    /// Sideways velocities below this are dropped while lining up.
    pub pfk_min_y_magnitude: f32,
    /// Extra distance beyond `pos_kick_dist` at which lining up is abandoned for an approach.
    pub pfk_approach_margin: f32,

    /// Step length of the side steps that put the ball in front of the kicking foot.
    pub side_step: f32,
    pub side_step_count: u32,
}

impl Default for KickBehaviorConfig {
    fn default() -> Self {
        Self {
            box_min_x: 0.02,
            box_max_x: 0.14,
            box_max_y: 0.08,
            foot_inner_y: 0.04,
            foot_outer_y: 0.10,
            max_forward_kick_angle: 55.0_f32.to_radians(),
            decide_lost_ball_frames: 120,
            pfk_x_gain: 0.5,
            pfk_y_gain: 0.5,
            pfk_max_x_speed: 0.03,
            pfk_max_y_speed: 0.03,
            pfk_min_y_magnitude: 0.015,
            pfk_approach_margin: 0.10,
            side_step: 0.04,
            side_step_count: 5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PositionBehaviorConfig {
    /// Distance to the position below which the robot walks omnidirectionally.
    pub omni_dist: f32,
    /// Frames the preferred movement mode has to differ before the robot changes it.
    pub change_omni_thresh: u32,
    /// Frames the robot has to be off its position before it walks back to it.
    pub not_at_position_thresh: u32,
}

impl Default for PositionBehaviorConfig {
    fn default() -> Self {
        Self {
            omni_dist: 0.5,
            change_omni_thresh: 5,
            not_at_position_thresh: 10,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HeadConfig {
    /// Frames the ball has to be missing before the head starts scanning for it.
    pub lost_ball_frames: u32,
    /// Frames the ball has to be seen before a scan is interrupted.
    pub track_frames_on: u32,
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            lost_ball_frames: 30,
            track_frames_on: 1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FallConfig {
    /// Torso pitch beyond which the robot is lying on the ground.
    #[serde(with = "degrees")]
    pub fallen_angle: f32,
    pub fall_count_thresh: u32,
}

impl Default for FallConfig {
    fn default() -> Self {
        Self {
            fallen_angle: 72.0_f32.to_radians(),
            fall_count_thresh: 15,
        }
    }
}
