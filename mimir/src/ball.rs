//! The ball as seen by vision and tracked by the ball filter.

use bevy::prelude::*;
use nalgebra::Point2;

use crate::localization::RobotPose;

/// Plugin providing the [`Ball`] resource, which is written by the ball tracker.
pub struct BallPlugin;

impl Plugin for BallPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Ball>();
    }
}

/// Per frame estimate of the ball.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    /// Whether the ball is seen in the current frame.
    pub on: bool,
    /// Consecutive frames the ball has been seen.
    pub frames_on: u32,
    /// Consecutive frames the ball has not been seen.
    pub frames_off: u32,
    /// Last position of the ball relative to the robot, as seen by vision.
    pub relative: Point2<f32>,
    /// Filtered position of the ball on the field.
    pub field: Point2<f32>,
}

impl Default for Ball {
    fn default() -> Self {
        Self {
            on: false,
            frames_on: 0,
            frames_off: u32::MAX,
            relative: Point2::origin(),
            field: Point2::origin(),
        }
    }
}

impl Ball {
    /// A ball seen in this frame at `relative`, with the robot at `pose`.
    #[must_use]
    pub fn seen(relative: Point2<f32>, pose: &RobotPose, frames_on: u32) -> Self {
        Self {
            on: true,
            frames_on,
            frames_off: 0,
            relative,
            field: pose.robot_to_world(&relative),
        }
    }

    /// Distance to the ball as last seen by vision.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.relative.coords.norm()
    }

    /// Bearing of the ball as last seen by vision.
    #[must_use]
    pub fn bearing(&self) -> f32 {
        self.relative.y.atan2(self.relative.x)
    }

    /// Distance to the ball if it is seen in this frame.
    #[must_use]
    pub fn visual_distance(&self) -> Option<f32> {
        self.on.then(|| self.distance())
    }

    /// Position of the filtered ball estimate relative to the robot.
    #[must_use]
    pub fn loc_relative(&self, pose: &RobotPose) -> Point2<f32> {
        pose.world_to_robot(&self.field)
    }

    /// Distance to the filtered ball estimate.
    #[must_use]
    pub fn loc_distance(&self, pose: &RobotPose) -> f32 {
        pose.distance_to(&self.field)
    }

    /// Bearing of the filtered ball estimate.
    #[must_use]
    pub fn loc_bearing(&self, pose: &RobotPose) -> f32 {
        pose.angle_to(&self.field)
    }

    /// Marks the ball as not seen for one more frame, keeping the last estimates.
    pub fn lose(&mut self) {
        self.on = false;
        self.frames_on = 0;
        self.frames_off = self.frames_off.saturating_add(1);
    }
}
