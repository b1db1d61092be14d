//! The robot pose as estimated by the localization.

use bevy::prelude::*;
use nalgebra::{Isometry2, Point2, UnitComplex, Vector2};

/// Plugin providing the localization estimate.
///
/// The estimate itself is written by the localization, this plugin only makes sure the
/// resources exist:
/// - [`RobotPose`]
/// - [`LocalizationQuality`]
pub struct LocalizationPlugin;

impl Plugin for LocalizationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RobotPose>()
            .init_resource::<LocalizationQuality>();
    }
}

#[derive(Resource, Default, Debug, Clone, Copy, PartialEq)]
pub struct RobotPose {
    pub inner: Isometry2<f32>,
}

impl RobotPose {
    #[must_use]
    pub fn from_isometry(pose: Isometry2<f32>) -> Self {
        Self { inner: pose }
    }

    #[must_use]
    pub fn from_translation_and_rotation(translation: Vector2<f32>, angle: f32) -> Self {
        let inner = Isometry2::new(translation, angle);
        Self { inner }
    }

    /// The current position of the robot in the world, in absolute coordinates.
    ///
    /// The center of the world is at the center of the field, with the x-axis pointing towards the
    /// opponent's goal.
    #[must_use]
    pub fn world_position(&self) -> Point2<f32> {
        self.inner.translation.vector.into()
    }

    /// The current rotation of the robot in the world, in radians.
    #[must_use]
    pub fn world_rotation(&self) -> f32 {
        self.inner.rotation.angle()
    }

    /// Transform a point from robot coordinates to world coordinates.
    #[must_use]
    pub fn robot_to_world(&self, point: &Point2<f32>) -> Point2<f32> {
        self.inner.transform_point(point)
    }

    /// Transform a point from world coordinates to robot coordinates.
    #[must_use]
    pub fn world_to_robot(&self, point: &Point2<f32>) -> Point2<f32> {
        self.inner.inverse_transform_point(point)
    }

    #[must_use]
    pub fn distance_to(&self, point: &Point2<f32>) -> f32 {
        (self.world_position() - point).norm()
    }

    /// Bearing of `point` relative to the heading of the robot, in `(-pi, pi]`.
    #[must_use]
    pub fn angle_to(&self, point: &Point2<f32>) -> f32 {
        let robot_to_point = self.world_to_robot(point);
        robot_to_point.y.atan2(robot_to_point.x)
    }

    /// Signed difference between `heading` and the heading of the robot, in `(-pi, pi]`.
    #[must_use]
    pub fn heading_error(&self, heading: f32) -> f32 {
        (UnitComplex::new(heading) / self.inner.rotation).angle()
    }
}

/// Confidence of the localization in its current estimate.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq)]
pub struct LocalizationQuality {
    /// Scalar uncertainty of the pose estimate, higher is worse.
    pub uncertainty: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{point, vector};
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn angle_to_is_relative_to_heading() {
        let pose = RobotPose::from_translation_and_rotation(vector![1.0, 1.0], FRAC_PI_2);

        assert!((pose.angle_to(&point![1.0, 2.0])).abs() < 1e-6);
        assert!((pose.angle_to(&point![0.0, 1.0]) - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn heading_error_wraps() {
        let pose = RobotPose::from_translation_and_rotation(vector![0.0, 0.0], 0.9 * PI);

        let error = pose.heading_error(-0.9 * PI);
        assert!((error - 0.2 * PI).abs() < 1e-5);
    }
}
