use std::time::Duration;

use bevy::prelude::*;
use colored::Color;
use nalgebra::Point2;
use norn::{Frame, StateMachine, Transition};
use strum::{Display, EnumIter};

use crate::{
    ball::Ball,
    cycle::FrameTime,
    motion::{
        HeadRequest, MotionStatus,
        sequence::{MotionLibrary, MotionSequence, SequenceQueue},
    },
};

use super::{BehaviorConfig, BehaviorSet, behavior_config::HeadConfig};

pub(super) struct HeadPlugin;

impl Plugin for HeadPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_head_tracker)
            .add_systems(Update, track.in_set(BehaviorSet::Head));
    }
}

fn setup_head_tracker(mut commands: Commands) {
    commands.insert_resource(HeadTracker::new().expect("failed to create head tracker"));
}

#[allow(clippy::too_many_arguments)]
fn track(
    mut tracker: ResMut<HeadTracker>,
    mut request: ResMut<HeadRequest>,
    mut sequences: ResMut<SequenceQueue>,
    time: Res<FrameTime>,
    ball: Res<Ball>,
    motion: Res<MotionStatus>,
    config: Res<BehaviorConfig>,
    library: Res<MotionLibrary>,
) {
    let mut context = HeadContext {
        now: time.now,
        ball: &ball,
        motion: &motion,
        config: &config.head,
        library: &library,
        sequences: &mut sequences,
    };

    tracker.run(&mut context);
    request.look_at = tracker.look_at();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum HeadState {
    Stopped,
    /// Looks at the ball while it is seen.
    BallTracking,
    /// Scans for a lost ball.
    ScanBall,
    /// Pans the head to see as many landmarks as possible.
    LocPans,
}

pub struct HeadContext<'a> {
    pub now: Duration,
    pub ball: &'a Ball,
    pub motion: &'a MotionStatus,
    pub config: &'a HeadConfig,
    pub library: &'a MotionLibrary,
    pub sequences: &'a mut SequenceQueue,
}

pub(crate) type HeadHandler =
    fn(&mut Gaze, &Frame<HeadState>, &mut HeadContext<'_>) -> Transition<HeadState>;

#[derive(Debug, Default, Clone)]
pub(crate) struct Gaze {
    look_at: Option<Point2<f32>>,
    /// The head sequence last requested is assumed to run at least until then.
    busy_until: Duration,
}

impl Gaze {
    /// Requests `sequence` unless the head is still executing one.
    fn play(&mut self, sequence: MotionSequence, context: &mut HeadContext<'_>) {
        if context.motion.head_active || context.now < self.busy_until {
            return;
        }

        context.sequences.push(sequence);
        self.busy_until = context.now + context.library.duration(sequence);
    }
}

/// Points the head at the ball, or moves it around to find the ball or landmarks.
#[derive(Resource, Debug, Clone)]
pub struct HeadTracker {
    machine: StateMachine<HeadState, HeadHandler>,
    gaze: Gaze,
}

impl HeadTracker {
    pub fn new() -> norn::Result<Self> {
        let machine = StateMachine::<HeadState, HeadHandler>::builder("head")
            .color(Color::Blue)
            .log_changes(false)
            .state(HeadState::Stopped, stopped)
            .state(HeadState::BallTracking, ball_tracking)
            .state(HeadState::ScanBall, scan_ball)
            .state(HeadState::LocPans, loc_pans)
            .build(HeadState::Stopped)?;

        Ok(Self {
            machine,
            gaze: Gaze::default(),
        })
    }

    pub fn run(&mut self, context: &mut HeadContext<'_>) {
        self.machine.run(context.now, |handler, frame| {
            handler(&mut self.gaze, frame, context)
        });
    }

    /// Follows the ball, scanning for it whenever it is lost.
    pub fn track_ball(&mut self) {
        if !matches!(
            self.machine.current(),
            HeadState::BallTracking | HeadState::ScanBall
        ) {
            self.machine.switch_to(HeadState::BallTracking);
        }
    }

    pub fn loc_pans(&mut self) {
        self.machine.ensure(HeadState::LocPans);
    }

    pub fn stop(&mut self) {
        self.machine.ensure(HeadState::Stopped);
    }

    #[must_use]
    pub fn state(&self) -> HeadState {
        self.machine.current()
    }

    /// Where the head should look this frame, relative to the robot.
    #[must_use]
    pub fn look_at(&self) -> Option<Point2<f32>> {
        self.gaze.look_at
    }
}

fn stopped(
    gaze: &mut Gaze,
    _: &Frame<HeadState>,
    _: &mut HeadContext<'_>,
) -> Transition<HeadState> {
    gaze.look_at = None;
    Transition::Stay
}

fn ball_tracking(
    gaze: &mut Gaze,
    _: &Frame<HeadState>,
    context: &mut HeadContext<'_>,
) -> Transition<HeadState> {
    if context.ball.frames_off > context.config.lost_ball_frames {
        return Transition::SwitchNow(HeadState::ScanBall);
    }

    gaze.look_at = Some(context.ball.relative);
    Transition::Stay
}

fn scan_ball(
    gaze: &mut Gaze,
    _: &Frame<HeadState>,
    context: &mut HeadContext<'_>,
) -> Transition<HeadState> {
    if context.ball.on && context.ball.frames_on >= context.config.track_frames_on {
        return Transition::SwitchNow(HeadState::BallTracking);
    }

    gaze.look_at = None;
    gaze.play(MotionSequence::ScanBall, context);
    Transition::Stay
}

fn loc_pans(
    gaze: &mut Gaze,
    _: &Frame<HeadState>,
    context: &mut HeadContext<'_>,
) -> Transition<HeadState> {
    gaze.look_at = None;
    gaze.play(MotionSequence::QuickPans, context);
    Transition::Stay
}

#[cfg(test)]
mod tests {
    use nalgebra::point;

    use super::*;
    use crate::localization::RobotPose;

    struct Robot {
        tracker: HeadTracker,
        ball: Ball,
        motion: MotionStatus,
        config: HeadConfig,
        library: MotionLibrary,
        sequences: SequenceQueue,
        frame: u64,
    }

    impl Robot {
        fn new() -> Self {
            Self {
                tracker: HeadTracker::new().unwrap(),
                ball: Ball::default(),
                motion: MotionStatus::default(),
                config: HeadConfig::default(),
                library: MotionLibrary::default(),
                sequences: SequenceQueue::default(),
                frame: 0,
            }
        }

        fn tick(&mut self) {
            let mut context = HeadContext {
                now: Duration::from_millis(self.frame * 12),
                ball: &self.ball,
                motion: &self.motion,
                config: &self.config,
                library: &self.library,
                sequences: &mut self.sequences,
            };
            self.tracker.run(&mut context);
            self.frame += 1;
        }

        fn scans(&mut self) -> usize {
            self.sequences
                .drain()
                .filter(|sequence| *sequence == MotionSequence::ScanBall)
                .count()
        }
    }

    #[test]
    fn looks_at_the_seen_ball() {
        let mut robot = Robot::new();
        robot.ball = Ball::seen(point![1.0, 0.5], &RobotPose::default(), 3);

        robot.tracker.track_ball();
        robot.tick();

        assert_eq!(robot.tracker.state(), HeadState::BallTracking);
        assert_eq!(robot.tracker.look_at(), Some(point![1.0, 0.5]));
    }

    #[test]
    fn lost_ball_starts_a_scan() {
        let mut robot = Robot::new();
        robot.ball = Ball::seen(point![1.0, 0.0], &RobotPose::default(), 3);
        robot.tracker.track_ball();
        robot.tick();

        for _ in 0..robot.config.lost_ball_frames {
            robot.ball.lose();
            robot.tick();
            assert_eq!(robot.tracker.state(), HeadState::BallTracking);
        }
        // still looking where the ball was last seen
        assert_eq!(robot.tracker.look_at(), Some(point![1.0, 0.0]));

        robot.ball.lose();
        robot.tick();
        assert_eq!(robot.tracker.state(), HeadState::ScanBall);
        assert_eq!(robot.scans(), 1);
        assert_eq!(robot.tracker.look_at(), None);
    }

    #[test]
    fn scan_is_repeated_once_the_head_is_idle() {
        let mut robot = Robot::new();
        robot.tracker.track_ball();
        robot.tick();
        assert_eq!(robot.scans(), 1);

        robot.motion.head_active = true;
        for _ in 0..10 {
            robot.tick();
        }
        assert_eq!(robot.scans(), 0);

        robot.motion.head_active = false;
        let scan_frames = robot.library.duration(MotionSequence::ScanBall).as_millis() / 12;
        for _ in 0..scan_frames {
            robot.tick();
        }
        assert_eq!(robot.scans(), 1);
    }

    #[test]
    fn found_ball_ends_the_scan() {
        let mut robot = Robot::new();
        robot.tracker.track_ball();
        robot.tick();
        assert_eq!(robot.tracker.state(), HeadState::ScanBall);

        robot.ball = Ball::seen(point![0.5, -0.5], &RobotPose::default(), 1);
        robot.tick();

        assert_eq!(robot.tracker.state(), HeadState::BallTracking);
        assert_eq!(robot.tracker.look_at(), Some(point![0.5, -0.5]));
    }

    #[test]
    fn tracking_request_keeps_a_running_scan() {
        let mut robot = Robot::new();
        robot.tracker.track_ball();
        robot.tick();
        let counter = robot.tracker.machine.counter();

        robot.tracker.track_ball();

        assert_eq!(robot.tracker.state(), HeadState::ScanBall);
        assert_eq!(robot.tracker.machine.counter(), counter);
    }

    #[test]
    fn loc_pans_play_quick_pans() {
        let mut robot = Robot::new();

        robot.tracker.loc_pans();
        robot.tick();

        assert!(robot.sequences.contains(MotionSequence::QuickPans));
        assert_eq!(robot.tracker.look_at(), None);

        robot.tracker.stop();
        robot.tick();
        assert_eq!(robot.tracker.state(), HeadState::Stopped);
    }
}
