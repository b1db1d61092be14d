use bevy::prelude::*;
use nalgebra::{Isometry2, Point2, Vector2, point};
use serde::{Deserialize, Serialize};

use super::{Config, angle::isometry_with_angle};

/// Config that contains information about the layout of the field and
/// robot positions.
#[derive(Resource, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    pub field: FieldConfig,
    /// Positions to walk to in the ready phase when we take the kick-off.
    pub kickoff_positions: FieldPositionsConfig,
    /// Positions to walk to in the ready phase when the opponent takes the kick-off.
    pub defending_positions: FieldPositionsConfig,
}

impl Config for LayoutConfig {
    const PATH: &'static str = "layout.toml";
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let positions = |poses: [(f32, f32, f32); 4]| {
            FieldPositionsConfig(
                poses
                    .into_iter()
                    .zip(1..)
                    .map(|((x, y, angle), player_number)| RobotPosition {
                        player_number,
                        pose: Isometry2::new(Vector2::new(x, y), angle.to_radians()),
                    })
                    .collect(),
            )
        };

        Self {
            field: FieldConfig::default(),
            kickoff_positions: positions([
                (-4.2, 0.0, 0.0),
                (-2.5, 1.0, 0.0),
                (-0.8, 0.0, 0.0),
                (-1.5, -1.5, 0.0),
            ]),
            defending_positions: positions([
                (-4.2, 0.0, 0.0),
                (-3.0, 0.8, 0.0),
                (-1.2, 0.0, 0.0),
                (-2.0, -1.5, 0.0),
            ]),
        }
    }
}

impl LayoutConfig {
    /// The ready position of `player_number`, if the layout has one.
    #[must_use]
    pub fn ready_position(&self, player_number: u8, our_kick_off: bool) -> Option<Isometry2<f32>> {
        let positions = if our_kick_off {
            &self.kickoff_positions
        } else {
            &self.defending_positions
        };

        positions.player(player_number).map(|position| position.pose)
    }
}

/// Config that contains information about the field dimensions.
///
/// Here it is assumed the centre point as coordinates (0, 0).
/// The x axis points towards the opponents' goal and runs parallel with the length.
/// The y axis points towards the left and runs parallel with the width.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    /// Field length in metres
    pub length: f32,
    /// Field width in metres
    pub width: f32,
    /// Distance between the goal posts
    pub goal_width: f32,
    /// Length of the goal area
    pub goal_area_length: f32,
    /// Width of the goal area
    pub goal_area_width: f32,
    /// Length of the penalty area
    pub penalty_area_length: f32,
    /// Width of the penalty area
    pub penalty_area_width: f32,
    /// Distance to the penalty mark from the goal line
    pub penalty_mark_distance: f32,
    /// Diameter of the centre circle
    pub centre_circle_diameter: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            length: 9.0,
            width: 6.0,
            goal_width: 1.5,
            goal_area_length: 0.6,
            goal_area_width: 2.2,
            penalty_area_length: 1.65,
            penalty_area_width: 4.0,
            penalty_mark_distance: 1.3,
            centre_circle_diameter: 1.5,
        }
    }
}

impl FieldConfig {
    /// Centre of our own goal line.
    #[must_use]
    pub fn own_goal(&self) -> Point2<f32> {
        point![-self.length / 2.0, 0.0]
    }

    /// Centre of the opponent's goal line.
    #[must_use]
    pub fn opponent_goal(&self) -> Point2<f32> {
        point![self.length / 2.0, 0.0]
    }

    /// Whether `point` lies within our own penalty area, which the goalie defends.
    #[must_use]
    pub fn in_own_goal_box(&self, point: &Point2<f32>) -> bool {
        point.x < -self.length / 2.0 + self.penalty_area_length
            && point.y.abs() < self.penalty_area_width / 2.0
    }

    /// Clamps `point` to lie within the field lines.
    #[must_use]
    pub fn clamp(&self, point: Point2<f32>) -> Point2<f32> {
        point![
            point.x.clamp(-self.length / 2.0, self.length / 2.0),
            point.y.clamp(-self.width / 2.0, self.width / 2.0)
        ]
    }
}

/// Contains the poses of a set of robot positions.
///
/// This configuration assumes the center has coordinates (0, 0).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FieldPositionsConfig(Vec<RobotPosition>);

impl FieldPositionsConfig {
    #[must_use]
    pub fn player(&self, player_number: u8) -> Option<&RobotPosition> {
        self.0
            .iter()
            .find(|position| position.player_number == player_number)
    }
}

/// Contains the pose for one robot position.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RobotPosition {
    /// Player number
    pub player_number: u8,

    /// Position and orientation of the robot
    #[serde(with = "isometry_with_angle")]
    pub pose: Isometry2<f32>,
}
