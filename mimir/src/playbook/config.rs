use std::time::Duration;

use bevy::prelude::*;
use nalgebra::{Point2, point};
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

use crate::config::Config;

/// Parameters of the role arbitration.
///
/// Chase times and their thresholds are in seconds, distances in metres. The thresholds depend
/// on how fast the robots walk and turn, recalibrate them when that changes.
#[serde_as]
#[derive(Resource, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PlaybookConfig {
    /// Number of players in the team, including the goalie.
    pub team_size: u8,
    pub goalie_number: u8,
    /// Player that takes the kick-off and starts as chaser in the ready phase.
    pub kickoff_striker_number: u8,
    /// Player that defends during the kick-off.
    pub kickoff_sweeper_number: u8,

    /// Time without packets after which a teammate is considered inactive.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub packet_dead_period: Duration,
    /// Time after our kick-off during which the kick-off formation is used.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub kickoff_formation_time: Duration,
    /// Time without anyone seeing the ball after which the team starts searching for it.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub finder_time: Duration,

    pub chase: ChaseConfig,
    pub positions: PositionsConfig,

    /// Always play the defender role.
    pub test_defender: bool,
    /// Always play the offender role.
    pub test_offender: bool,
    /// Always play the chaser role.
    pub test_chaser: bool,
}

impl Config for PlaybookConfig {
    const PATH: &'static str = "playbook.toml";
}

impl Default for PlaybookConfig {
    fn default() -> Self {
        Self {
            team_size: 4,
            goalie_number: 1,
            kickoff_striker_number: 3,
            kickoff_sweeper_number: 2,
            packet_dead_period: Duration::from_millis(5000),
            kickoff_formation_time: Duration::from_millis(5000),
            finder_time: Duration::from_millis(5000),
            chase: ChaseConfig::default(),
            positions: PositionsConfig::default(),
            test_defender: false,
            test_offender: false,
            test_chaser: false,
        }
    }
}

/// Parameters of the chaser election.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChaseConfig {
    /// Nominal approach speed used to turn a distance into a chase time.
    pub chase_speed: f32,
    /// Added to the chase time of a robot that is getting up.
    pub fallen_penalty: f32,
    /// Subtracted from the chase time of a robot that sees the ball.
    pub ball_seen_bonus: f32,
    /// Lateral distance between two ball estimates beyond which robots are not compared.
    pub ball_disagreement: f32,

    /// Advantage the higher numbered robot needs before the lower numbered one calls off.
    pub call_off_thresh: f32,
    pub call_off_scale: f32,
    /// Advantage needed when the lower numbered robot was the chaser last frame.
    pub stop_calling_thresh: f32,
    pub stop_calling_scale: f32,
    /// Advantage a higher numbered robot that claims the chaser role needs to keep it.
    pub listen_thresh: f32,
    pub listen_scale: f32,

    /// Frames a new sub-role has to be proposed before it is committed.
    pub sub_role_switch_buffer: u32,
}

impl Default for ChaseConfig {
    fn default() -> Self {
        Self {
            chase_speed: 0.2,
            fallen_penalty: 5.0,
            ball_seen_bonus: 0.1,
            ball_disagreement: 1.5,
            call_off_thresh: 0.125,
            call_off_scale: 0.15,
            stop_calling_thresh: 0.275,
            stop_calling_scale: 0.35,
            listen_thresh: 0.25,
            listen_scale: 0.25,
            sub_role_switch_buffer: 10,
        }
    }
}

/// Where the sub-roles position themselves on the field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PositionsConfig {
    /// Distance of a stopper to the ball, on the line from the ball to our goal.
    pub defender_ball_dist: f32,
    /// A stopper never goes further forward than this.
    pub stopper_max_x: f32,
    pub sweeper_x: f32,
    pub deep_back_x: f32,
    pub deep_back_y: f32,
    /// Distance of a wing in front of the ball.
    pub wing_x_offset: f32,
    pub wing_min_x: f32,
    pub wing_max_x: f32,
    pub wing_y: f32,
    pub dub_d_offender_x: f32,
    /// Distance of the goalie in front of the goal line.
    pub goalie_x_offset: f32,
    pub front_finder: Point2<f32>,
    pub left_finder: Point2<f32>,
    pub right_finder: Point2<f32>,
    pub other_finder: Point2<f32>,
}

impl Default for PositionsConfig {
    fn default() -> Self {
        Self {
            defender_ball_dist: 1.0,
            stopper_max_x: -0.5,
            sweeper_x: -3.2,
            deep_back_x: -3.6,
            deep_back_y: 1.0,
            wing_x_offset: 1.0,
            wing_min_x: -1.0,
            wing_max_x: 3.0,
            wing_y: 1.5,
            dub_d_offender_x: -1.0,
            goalie_x_offset: 0.25,
            front_finder: point![1.0, 0.0],
            left_finder: point![-1.0, 1.5],
            right_finder: point![-1.0, -1.5],
            other_finder: point![-2.5, 0.0],
        }
    }
}
