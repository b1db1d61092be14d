use std::{f32::consts::FRAC_PI_2, time::Duration};

use nalgebra::{Point2, point};

use super::*;
use crate::{
    behavior::{HeadState, behavior_config::KickBehaviorConfig},
    motion::MotionCommand,
    navigation::NavState,
    playbook::{PlaybookConfig, StrategyContext},
};

struct Robot {
    player: Player,
    navigator: Navigator,
    head: HeadTracker,
    sequences: SequenceQueue,
    arbiter: RoleArbiter,
    playbook: PlaybookConfig,
    primary_state: PrimaryState,
    fallen: bool,
    ball: Ball,
    pose: RobotPose,
    quality: LocalizationQuality,
    motion: MotionStatus,
    layout: LayoutConfig,
    library: MotionLibrary,
    config: BehaviorConfig,
    nav_config: NavigatorConfig,
    frame: u64,
}

impl Robot {
    fn new(player_number: u8, primary_state: PrimaryState) -> Self {
        let playbook = PlaybookConfig::default();

        Self {
            player: Player::new().unwrap(),
            navigator: Navigator::new().unwrap(),
            head: HeadTracker::new().unwrap(),
            sequences: SequenceQueue::default(),
            arbiter: RoleArbiter::new(player_number, &playbook).unwrap(),
            playbook,
            primary_state,
            fallen: false,
            ball: Ball::default(),
            pose: RobotPose::default(),
            quality: LocalizationQuality::default(),
            motion: MotionStatus::default(),
            layout: LayoutConfig::default(),
            library: MotionLibrary::default(),
            config: BehaviorConfig::default(),
            nav_config: NavigatorConfig::default(),
            frame: 0,
        }
    }

    fn now(&self) -> Duration {
        Duration::from_millis(self.frame * 12)
    }

    /// Runs the arbiter, the player and the navigator for one frame, in the order the app
    /// runs them.
    fn tick(&mut self) {
        let now = self.now();

        let strategy = StrategyContext {
            now,
            primary_state: self.primary_state,
            our_kick_off: false,
            pose: &self.pose,
            ball: &self.ball,
            possession: self.player.possession(),
            fallen: self.fallen,
            config: &self.playbook,
            layout: &self.layout,
        };
        self.arbiter.run(&strategy, Vec::new());

        let mut context = PlayerContext {
            now,
            primary_state: self.primary_state,
            fallen: self.fallen,
            ball: &self.ball,
            pose: &self.pose,
            quality: &self.quality,
            motion: &self.motion,
            arbiter: &self.arbiter,
            layout: &self.layout,
            library: &self.library,
            config: &self.config,
            nav_config: &self.nav_config,
            navigator: &mut self.navigator,
            head: &mut self.head,
            sequences: &mut self.sequences,
        };
        self.player.run(&mut context);

        let nav = NavContext {
            pose: &self.pose,
            quality: &self.quality,
            motion: &self.motion,
            config: &self.nav_config,
        };
        self.navigator.run(now, &nav);
        self.frame += 1;

        match self.navigator.take_command() {
            Some(MotionCommand::Walk(walk)) => self.motion.walk_active = !walk.is_zero(),
            Some(MotionCommand::Step(_)) => self.motion.walk_active = true,
            None => {}
        }
    }

    fn place(&mut self, position: Point2<f32>, heading: f32) {
        self.pose = RobotPose::from_translation_and_rotation(position.coords, heading);
    }

    fn sees_ball(&mut self, relative: Point2<f32>) {
        self.ball = Ball::seen(relative, &self.pose, 10);
    }

    /// Puts the ball at `position` without the robot seeing it.
    fn ball_at(&mut self, position: Point2<f32>) {
        self.ball = Ball {
            field: position,
            ..Ball::default()
        };
    }

    fn state(&self) -> PlayerState {
        self.player.state()
    }
}

#[test]
fn initial_stands_still() {
    let mut robot = Robot::new(3, PrimaryState::Initial);
    robot.tick();

    assert_eq!(robot.state(), PlayerState::GameInitial);
    assert!(robot.navigator.is_stopped());
    assert_eq!(robot.head.state(), HeadState::Stopped);
}

#[test]
fn ready_walks_to_ready_position() {
    let mut robot = Robot::new(3, PrimaryState::Ready);
    robot.tick();

    assert_eq!(robot.state(), PlayerState::PlaybookPosition);
    let destination = robot.navigator.current_destination().unwrap();
    assert_eq!(destination.position, point![-1.2, 0.0]);
    assert_eq!(robot.head.state(), HeadState::LocPans);
}

#[test]
fn ball_straight_ahead_is_approached() {
    let mut robot = Robot::new(3, PrimaryState::Playing);
    robot.sees_ball(point![1.0, 0.0]);
    robot.tick();

    assert!(robot.arbiter.is_chaser());
    assert_eq!(robot.state(), PlayerState::ApproachBall);
    assert_eq!(robot.navigator.state(), NavState::Walking);

    let walk = robot.navigator.walk_vector();
    assert!((walk.forward - robot.config.chase.approach_max_x_speed).abs() < 1e-6);
    assert_eq!(walk.turn, 0.0);
    assert_eq!(robot.head.state(), HeadState::BallTracking);
}

#[test]
fn ball_to_the_side_is_turned_to_first() {
    let mut robot = Robot::new(3, PrimaryState::Playing);
    robot.sees_ball(point![1.0, 1.0]);
    robot.tick();

    assert_eq!(robot.state(), PlayerState::TurnToBall);
    let walk = robot.navigator.walk_vector();
    assert_eq!(walk.forward, 0.0);
    assert!((walk.turn - robot.config.chase.ball_spin_speed).abs() < 1e-6);
}

#[test]
fn lost_ball_is_scanned_for_then_spun_for() {
    let mut robot = Robot::new(3, PrimaryState::Playing);
    let scan = robot.library.duration(MotionSequence::ScanBall);
    let scan_frames = scan.as_millis().div_ceil(12);

    for _ in 0..=scan_frames {
        robot.tick();
        assert_eq!(robot.state(), PlayerState::ScanFindBall);
        assert!(robot.navigator.is_stopped());
    }

    robot.tick();
    assert_eq!(robot.state(), PlayerState::SpinFindBall);
    let walk = robot.navigator.walk_vector();
    assert!((walk.turn - robot.config.chase.find_spin_speed).abs() < 1e-6);
}

#[test]
fn ball_in_front_of_the_left_foot_is_kicked_straight() {
    let mut robot = Robot::new(3, PrimaryState::Playing);
    robot.sees_ball(point![0.08, 0.06]);

    robot.tick();
    assert_eq!(robot.state(), PlayerState::WaitBeforeKick);
    robot.tick();
    assert_eq!(robot.state(), PlayerState::DecideKick);
    robot.tick();

    assert_eq!(robot.state(), PlayerState::KickBallExecute);
    assert_eq!(robot.player.ball_foot(), BallFoot::Left);
    assert_eq!(robot.player.chosen_kick(), Some(MotionSequence::LeftFarKick));
    assert!(robot.sequences.contains(MotionSequence::LeftFarKick));
    assert!(robot.player.possession().kicking);
}

#[test]
fn goal_to_the_left_is_reached_with_a_side_kick() {
    let mut robot = Robot::new(3, PrimaryState::Playing);
    robot.place(Point2::origin(), -FRAC_PI_2);
    robot.sees_ball(point![0.08, 0.0]);

    for _ in 0..3 {
        robot.tick();
    }

    assert_eq!(robot.player.ball_foot(), BallFoot::MidLeft);
    assert_eq!(robot.state(), PlayerState::KickBallExecute);
    assert_eq!(robot.player.chosen_kick(), Some(MotionSequence::RightSideKick));
}

#[test]
fn side_kick_steps_the_ball_between_the_feet() {
    let mut robot = Robot::new(3, PrimaryState::Playing);
    robot.place(Point2::origin(), FRAC_PI_2);
    robot.sees_ball(point![0.08, -0.06]);

    for _ in 0..3 {
        robot.tick();
    }
    assert_eq!(robot.player.ball_foot(), BallFoot::Right);
    assert_eq!(robot.player.chosen_kick(), Some(MotionSequence::LeftSideKick));
    assert_eq!(robot.state(), PlayerState::StepRightForKick);
    assert_eq!(robot.navigator.state(), NavState::Stepping);

    robot.tick();
    assert_eq!(robot.state(), PlayerState::StepRightForKick);

    // the walking engine finishes the steps
    robot.motion.walk_active = false;
    robot.tick();
    assert!(robot.navigator.is_stopped());
    assert!(robot.sequences.is_empty());

    robot.tick();
    assert_eq!(robot.state(), PlayerState::KickBallExecute);
    assert!(robot.sequences.contains(MotionSequence::LeftSideKick));
}

#[test]
fn ball_foot_follows_the_lateral_offset() {
    let kick = KickBehaviorConfig::default();

    assert_eq!(BallFoot::of(0.06, &kick), BallFoot::Left);
    assert_eq!(BallFoot::of(0.04, &kick), BallFoot::Left);
    assert_eq!(BallFoot::of(0.0, &kick), BallFoot::MidLeft);
    assert_eq!(BallFoot::of(-0.01, &kick), BallFoot::MidRight);
    assert_eq!(BallFoot::of(-0.04, &kick), BallFoot::Right);
    assert_eq!(BallFoot::of(0.10, &kick), BallFoot::Incorrect);
    assert_eq!(BallFoot::of(-0.12, &kick), BallFoot::Incorrect);
}

#[test]
fn kick_ends_in_a_new_chase() {
    let mut robot = Robot::new(3, PrimaryState::Playing);
    robot.sees_ball(point![0.08, 0.06]);
    for _ in 0..3 {
        robot.tick();
    }
    assert_eq!(robot.state(), PlayerState::KickBallExecute);

    let kick = robot.library.duration(MotionSequence::LeftFarKick);
    let kick_frames = kick.as_millis().div_ceil(12);
    for _ in 0..=kick_frames {
        robot.tick();
    }
    assert_eq!(robot.state(), PlayerState::AfterKick);
    assert_eq!(robot.player.chosen_kick(), None);
    assert!(!robot.player.possession().kicking);

    robot.tick();
    assert_eq!(robot.state(), PlayerState::WaitBeforeKick);
}

#[test]
fn losing_the_chaser_role_walks_to_the_position() {
    let mut robot = Robot::new(1, PrimaryState::Playing);
    robot.ball_at(point![-4.0, 0.2]);
    robot.tick();

    assert!(robot.arbiter.is_chaser());
    assert_eq!(robot.state(), PlayerState::ScanFindBall);

    robot.ball_at(point![0.0, 0.0]);
    for _ in 0..=robot.playbook.chase.sub_role_switch_buffer {
        robot.tick();
    }

    assert!(!robot.arbiter.is_chaser());
    assert_eq!(robot.state(), PlayerState::PlaybookPosition);
    assert_eq!(robot.head.state(), HeadState::BallTracking);
}

#[test]
fn fallen_robot_stops_and_restarts_the_game_state() {
    let mut robot = Robot::new(3, PrimaryState::Playing);
    robot.sees_ball(point![1.0, 0.0]);
    robot.tick();
    assert_eq!(robot.state(), PlayerState::ApproachBall);
    assert!(robot.motion.walk_active);

    robot.fallen = true;
    robot.tick();
    robot.tick();
    assert!(robot.navigator.is_stopped());
    assert_eq!(robot.state(), PlayerState::ApproachBall);

    robot.fallen = false;
    robot.tick();
    assert_eq!(robot.state(), PlayerState::ApproachBall);
    assert_eq!(robot.navigator.state(), NavState::Walking);
}

#[test]
fn displaced_robot_returns_to_its_position() {
    let mut robot = Robot::new(3, PrimaryState::Ready);
    robot.place(point![-1.2, 0.0], 0.0);

    for _ in 0..50 {
        robot.tick();
        if robot.state() == PlayerState::AtPosition {
            break;
        }
    }
    assert_eq!(robot.state(), PlayerState::AtPosition);

    robot.place(point![-0.2, 0.0], 0.0);
    for _ in 0..=robot.config.position.not_at_position_thresh {
        robot.tick();
        assert_eq!(robot.state(), PlayerState::AtPosition);
    }

    robot.tick();
    assert_eq!(robot.state(), PlayerState::PlaybookPosition);
    let destination = robot.navigator.current_destination().unwrap();
    assert_eq!(destination.position, point![-1.2, 0.0]);
}
