use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use strum::{Display, EnumIter};

use crate::config::Config;

/// A canned joint trajectory of the motion library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum MotionSequence {
    LeftFarKick,
    RightFarKick,
    LeftSideKick,
    RightSideKick,
    StandUpFront,
    StandUpBack,
    ScanBall,
    QuickPans,
}

impl MotionSequence {
    /// Whether the sequence only moves the head.
    #[must_use]
    pub fn is_head(self) -> bool {
        matches!(self, MotionSequence::ScanBall | MotionSequence::QuickPans)
    }
}

/// Durations of the sequences in the motion library.
#[serde_as]
#[derive(Resource, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MotionLibrary {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub left_far_kick: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub right_far_kick: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub left_side_kick: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub right_side_kick: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub stand_up_front: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub stand_up_back: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub scan_ball: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub quick_pans: Duration,
}

impl Config for MotionLibrary {
    const PATH: &'static str = "motion.toml";
}

impl Default for MotionLibrary {
    fn default() -> Self {
        Self {
            left_far_kick: Duration::from_millis(2400),
            right_far_kick: Duration::from_millis(2400),
            left_side_kick: Duration::from_millis(2000),
            right_side_kick: Duration::from_millis(2000),
            stand_up_front: Duration::from_millis(6500),
            stand_up_back: Duration::from_millis(7500),
            scan_ball: Duration::from_millis(3000),
            quick_pans: Duration::from_millis(2000),
        }
    }
}

impl MotionLibrary {
    /// How long the sequence takes to execute.
    #[must_use]
    pub fn duration(&self, sequence: MotionSequence) -> Duration {
        match sequence {
            MotionSequence::LeftFarKick => self.left_far_kick,
            MotionSequence::RightFarKick => self.right_far_kick,
            MotionSequence::LeftSideKick => self.left_side_kick,
            MotionSequence::RightSideKick => self.right_side_kick,
            MotionSequence::StandUpFront => self.stand_up_front,
            MotionSequence::StandUpBack => self.stand_up_back,
            MotionSequence::ScanBall => self.scan_ball,
            MotionSequence::QuickPans => self.quick_pans,
        }
    }
}

/// Sequences requested this frame, executed fire-and-forget by the motion engine.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct SequenceQueue(Vec<MotionSequence>);

impl SequenceQueue {
    pub fn push(&mut self, sequence: MotionSequence) {
        tracing::debug!("executing {sequence}");
        self.0.push(sequence);
    }

    /// Takes all requested sequences, leaving the queue empty.
    pub fn drain(&mut self) -> impl Iterator<Item = MotionSequence> + '_ {
        self.0.drain(..)
    }

    #[must_use]
    pub fn contains(&self, sequence: MotionSequence) -> bool {
        self.0.contains(&sequence)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
