use std::time::Duration;

use bevy::prelude::*;
use colored::Color;
use norn::{Frame, StateMachine, Transition};
use strum::{Display, EnumIter};
use tracing::info;

use crate::{
    cycle::FrameTime,
    motion::sequence::{MotionLibrary, MotionSequence, SequenceQueue},
    primary_state::PrimaryState,
    sensor::Inertial,
};

use super::{BehaviorConfig, BehaviorSet, behavior_config::FallConfig};

pub(super) struct FallPlugin;

impl Plugin for FallPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_fall_monitor)
            .add_systems(Update, monitor_falls.in_set(BehaviorSet::Fall));
    }
}

fn setup_fall_monitor(mut commands: Commands) {
    commands.insert_resource(FallMonitor::new().expect("failed to create fall monitor"));
}

fn monitor_falls(
    mut monitor: ResMut<FallMonitor>,
    mut sequences: ResMut<SequenceQueue>,
    time: Res<FrameTime>,
    primary_state: Res<PrimaryState>,
    inertial: Res<Inertial>,
    config: Res<BehaviorConfig>,
    library: Res<MotionLibrary>,
) {
    let mut context = FallContext {
        primary_state: *primary_state,
        inertial: &inertial,
        config: &config.fall,
        library: &library,
        sequences: &mut sequences,
    };

    monitor.run(time.now, &mut context);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum FallState {
    NotFallen,
    /// Picks the stand up sequence for the side the robot is lying on.
    Fallen,
    /// Waits for the stand up sequence to finish.
    StandingUp,
}

pub struct FallContext<'a> {
    pub primary_state: PrimaryState,
    pub inertial: &'a Inertial,
    pub config: &'a FallConfig,
    pub library: &'a MotionLibrary,
    pub sequences: &'a mut SequenceQueue,
}

pub(crate) type FallHandler =
    fn(&mut Recovery, &Frame<FallState>, &mut FallContext<'_>) -> Transition<FallState>;

#[derive(Debug, Default, Clone)]
pub(crate) struct Recovery {
    /// Consecutive frames the torso has been tilted beyond the fallen angle.
    tilted: u32,
    stand_up: Option<MotionSequence>,
}

/// Detects falls and gets the robot back on its feet.
#[derive(Resource, Debug, Clone)]
pub struct FallMonitor {
    machine: StateMachine<FallState, FallHandler>,
    recovery: Recovery,
}

impl FallMonitor {
    pub fn new() -> norn::Result<Self> {
        let machine = StateMachine::<FallState, FallHandler>::builder("fall")
            .color(Color::Red)
            .state(FallState::NotFallen, not_fallen)
            .state(FallState::Fallen, fallen)
            .state(FallState::StandingUp, standing_up)
            .build(FallState::NotFallen)?;

        Ok(Self {
            machine,
            recovery: Recovery::default(),
        })
    }

    pub fn run(&mut self, now: Duration, context: &mut FallContext<'_>) {
        let watching = matches!(
            context.primary_state,
            PrimaryState::Ready | PrimaryState::Playing
        ) && self.machine.is(FallState::NotFallen);

        if watching && context.inertial.pitch.abs() > context.config.fallen_angle {
            self.recovery.tilted += 1;
        } else {
            self.recovery.tilted = 0;
        }

        if self.recovery.tilted > context.config.fall_count_thresh {
            info!("fell over at a pitch of {:.0}°", context.inertial.pitch.to_degrees());
            self.recovery.tilted = 0;
            self.machine.switch_to(FallState::Fallen);
        }

        self.machine.run(now, |handler, frame| {
            handler(&mut self.recovery, frame, context)
        });
    }

    /// Whether the robot is lying on the ground or getting up.
    #[must_use]
    pub fn is_recovering(&self) -> bool {
        !self.machine.is(FallState::NotFallen)
    }

    #[must_use]
    pub fn state(&self) -> FallState {
        self.machine.current()
    }
}

fn not_fallen(
    _: &mut Recovery,
    _: &Frame<FallState>,
    _: &mut FallContext<'_>,
) -> Transition<FallState> {
    Transition::Stay
}

fn fallen(
    recovery: &mut Recovery,
    _: &Frame<FallState>,
    context: &mut FallContext<'_>,
) -> Transition<FallState> {
    let stand_up = if context.inertial.pitch > 0.0 {
        MotionSequence::StandUpFront
    } else {
        MotionSequence::StandUpBack
    };

    context.sequences.push(stand_up);
    recovery.stand_up = Some(stand_up);
    Transition::SwitchNow(FallState::StandingUp)
}

fn standing_up(
    recovery: &mut Recovery,
    frame: &Frame<FallState>,
    context: &mut FallContext<'_>,
) -> Transition<FallState> {
    let duration = recovery
        .stand_up
        .map_or(Duration::ZERO, |sequence| context.library.duration(sequence));

    Transition::later_if(frame.state_time >= duration, FallState::NotFallen)
}
