use std::time::Duration;

use bevy::{prelude::*, time::TimeSystem};

/// Plugin that adds resources and systems for tracking the cycles of the decision loop.
pub struct CyclePlugin;

impl Plugin for CyclePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Cycle>()
            .init_resource::<FrameTime>()
            .add_systems(First, update_cycle.after(TimeSystem));
    }
}

/// A resource that keeps track of the number of cycles since the decision loop has been running.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Resource)]
pub struct Cycle(pub usize);

/// Monotonic timestamp of the current cycle, shared by every behavior in the cycle.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Resource)]
pub struct FrameTime {
    pub now: Duration,
}

fn update_cycle(mut cycle: ResMut<Cycle>, mut frame_time: ResMut<FrameTime>, time: Res<Time>) {
    cycle.0 += 1;
    frame_time.now = time.elapsed();
}
