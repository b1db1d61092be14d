//! Interface to the motion engine: walk and step commands, head requests and canned sequences.

pub mod sequence;

use bevy::prelude::*;
use nalgebra::Point2;

use sequence::SequenceQueue;

/// Plugin providing the resources shared with the motion engine:
/// - [`MotionStatus`]
/// - [`MotionRequest`]
/// - [`HeadRequest`]
/// - [`SequenceQueue`]
///
/// Requests live for a single cycle, whatever the motion engine did not take by the start of
/// the next cycle is dropped.
pub struct MotionPlugin;

impl Plugin for MotionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MotionStatus>()
            .init_resource::<MotionRequest>()
            .init_resource::<HeadRequest>()
            .init_resource::<SequenceQueue>()
            .add_systems(First, clear_requests);
    }
}

fn clear_requests(mut request: ResMut<MotionRequest>, mut sequences: ResMut<SequenceQueue>) {
    request.0 = None;
    for sequence in sequences.drain() {
        tracing::debug!(%sequence, "dropping sequence that was not started");
    }
}

/// A walking velocity, in metres per second and radians per second.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct WalkCommand {
    pub forward: f32,
    pub left: f32,
    pub turn: f32,
}

impl WalkCommand {
    pub const ZERO: Self = Self {
        forward: 0.0,
        left: 0.0,
        turn: 0.0,
    };

    #[must_use]
    pub fn new(forward: f32, left: f32, turn: f32) -> Self {
        Self {
            forward,
            left,
            turn,
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// A fixed number of steps with the given step size.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StepCommand {
    pub forward: f32,
    pub left: f32,
    pub turn: f32,
    pub count: u32,
}

/// A command for the walking engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionCommand {
    Walk(WalkCommand),
    Step(StepCommand),
}

/// Status reported by the motion engine.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MotionStatus {
    /// Whether the walking engine is executing a walk or steps.
    pub walk_active: bool,
    /// Whether the head is executing a sequence.
    pub head_active: bool,
}

/// The motion command for the walking engine issued this frame, if any.
///
/// Commands are fire-and-forget: the walking engine takes the command and keeps executing it
/// until a new one arrives.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct MotionRequest(pub Option<MotionCommand>);

/// Point on the field, relative to the robot, the head should look at.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct HeadRequest {
    pub look_at: Option<Point2<f32>>,
}
