//! Inertial measurements used to detect falls.

use bevy::prelude::*;

/// Plugin providing the [`Inertial`] resource, which is written by the sensor filter.
pub struct SensorPlugin;

impl Plugin for SensorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Inertial>();
    }
}

/// Filtered orientation of the torso.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct Inertial {
    /// Rotation around the y axis in radians, positive when leaning forward.
    pub pitch: f32,
}
