use std::time::Duration;

use itertools::Itertools;
use nalgebra::{Isometry2, Point2, point};

use super::*;

struct Robot {
    arbiter: RoleArbiter,
    config: PlaybookConfig,
    layout: LayoutConfig,
    pose: RobotPose,
    ball: Ball,
    primary_state: PrimaryState,
    our_kick_off: bool,
    frame: u64,
}

impl Robot {
    fn new(player_number: u8) -> Self {
        Self::with_config(player_number, PlaybookConfig::default())
    }

    fn with_config(player_number: u8, config: PlaybookConfig) -> Self {
        Self {
            arbiter: RoleArbiter::new(player_number, &config).unwrap(),
            config,
            layout: LayoutConfig::default(),
            pose: RobotPose::default(),
            ball: Ball::default(),
            primary_state: PrimaryState::Playing,
            our_kick_off: false,
            frame: 0,
        }
    }

    fn now(&self) -> Duration {
        Duration::from_millis(self.frame * 12)
    }

    fn tick(&mut self, packets: Vec<TeamPacket>) -> TeamPacket {
        let context = StrategyContext {
            now: self.now(),
            primary_state: self.primary_state,
            our_kick_off: self.our_kick_off,
            pose: &self.pose,
            ball: &self.ball,
            possession: Possession::NONE,
            fallen: false,
            config: &self.config,
            layout: &self.layout,
        };
        let packet = self.arbiter.run(&context, packets);
        self.frame += 1;
        packet
    }

    fn place(&mut self, position: Point2<f32>) {
        self.pose = RobotPose::from_translation_and_rotation(position.coords, 0.0);
    }

    /// Puts the ball at `position` without this robot seeing it.
    fn ball_at(&mut self, position: Point2<f32>) {
        self.ball = Ball {
            field: position,
            ..Ball::default()
        };
    }

    /// Puts the ball at `relative` in front of this robot, which sees it.
    fn sees_ball(&mut self, relative: Point2<f32>) {
        self.ball = Ball::seen(relative, &self.pose, 10);
    }
}

/// A packet of a teammate standing at `position` that sees the ball at `ball`.
fn packet(player_number: u8, position: Point2<f32>, ball: Point2<f32>) -> TeamPacket {
    let distance = (ball - position).norm();

    TeamPacket {
        player_number,
        pose: Isometry2::translation(position.x, position.y),
        ball,
        ball_on: true,
        visual_ball_distance: Some(distance),
        loc_ball_distance: distance,
        chase_time: 0.0,
        role: Role::Init,
        sub_role: SubRole::Init,
        possession: Possession::NONE,
        fallen: false,
        penalized: false,
    }
}

#[test]
fn closest_robot_chases() {
    let mut robot = Robot::new(3);
    robot.sees_ball(point![0.2, 0.0]);
    let ball = robot.ball.field;

    robot.tick(vec![
        packet(2, point![-3.0, 0.0], ball),
        packet(4, point![-2.0, 1.0], ball),
    ]);

    assert_eq!(robot.arbiter.my_strategy(), Strategy::Spread);
    assert_eq!(robot.arbiter.my_role(), Role::Chaser);
    assert_eq!(robot.arbiter.my_sub_role(), SubRole::ChaseNormal);
    assert_eq!(robot.arbiter.my_position().position, ball);
}

#[test]
fn teammate_with_ball_takes_chaser_role() {
    let mut robot = Robot::new(3);
    robot.sees_ball(point![0.2, 0.0]);
    let ball = robot.ball.field;

    let holder = TeamPacket {
        possession: Possession {
            dribbling: true,
            ..Possession::NONE
        },
        ..packet(2, point![-3.0, 0.0], ball)
    };
    robot.tick(vec![holder, packet(4, point![-2.0, 1.0], ball)]);

    assert_ne!(robot.arbiter.my_role(), Role::Chaser);
    assert!(robot.arbiter.team().teammate_has_ball());
    assert_eq!(robot.arbiter.team().determine_chaser(&robot.config), 2);
}

#[test]
fn team_agrees_on_a_single_chaser() {
    let mut team = [(2, -0.56), (3, -0.48), (4, -0.40)].map(|(number, x)| {
        let mut robot = Robot::new(number);
        robot.place(point![x, 0.0]);
        robot.ball_at(Point2::origin());
        robot
    });
    let mut packets: Vec<TeamPacket> = Vec::new();

    for frame in 0..100 {
        packets = team
            .iter_mut()
            .map(|robot| {
                let number = robot.arbiter.team().me().number;
                let received = packets
                    .iter()
                    .filter(|packet| packet.player_number != number)
                    .copied()
                    .collect();
                robot.tick(received)
            })
            .collect();

        if frame > 0 {
            let chasers = team
                .iter()
                .filter(|robot| robot.arbiter.my_role() == Role::Chaser)
                .map(|robot| robot.arbiter.team().me().number)
                .collect_vec();
            assert_eq!(chasers, [4], "chasers in frame {frame}");
        }
    }
}

#[test]
fn silent_teammate_is_excluded_after_dead_period() {
    let mut robot = Robot::new(3);
    robot.sees_ball(point![1.0, 0.0]);
    let ball = robot.ball.field;

    // player 2 stands right next to the ball but only sends a single packet
    robot.tick(vec![
        packet(2, point![0.9, 0.0], ball),
        packet(4, point![-3.0, -1.0], ball),
    ]);
    assert_ne!(robot.arbiter.my_role(), Role::Chaser);

    while robot.now() <= robot.config.packet_dead_period {
        robot.tick(vec![packet(4, point![-3.0, -1.0], ball)]);
        assert_eq!(robot.arbiter.my_strategy(), Strategy::Spread);
        assert_ne!(robot.arbiter.my_role(), Role::Chaser);
    }

    robot.tick(vec![packet(4, point![-3.0, -1.0], ball)]);
    assert_eq!(robot.arbiter.my_strategy(), Strategy::OneDown);
    assert_eq!(robot.arbiter.my_role(), Role::Chaser);
    assert!(!robot.arbiter.team().teammate(2).unwrap().active);
}

#[test]
fn sub_role_change_is_buffered() {
    let config = PlaybookConfig {
        team_size: 3,
        ..PlaybookConfig::default()
    };
    let buffer = config.chase.sub_role_switch_buffer;
    let mut robot = Robot::with_config(2, config);
    robot.place(point![-2.0, 0.0]);

    let ball = point![1.0, 0.5];
    robot.ball_at(ball);
    for _ in 0..3 {
        robot.tick(vec![packet(3, ball, ball)]);
    }
    assert_eq!(robot.arbiter.my_role(), Role::Defender);
    assert_eq!(robot.arbiter.my_sub_role(), SubRole::Stopper);

    let ball = point![-1.0, 0.5];
    robot.ball_at(ball);
    for _ in 0..buffer {
        robot.tick(vec![packet(3, ball, ball)]);
        assert_eq!(robot.arbiter.my_sub_role(), SubRole::Stopper);
    }

    robot.tick(vec![packet(3, ball, ball)]);
    assert_eq!(robot.arbiter.my_sub_role(), SubRole::DeepStopper);
    assert_eq!(robot.arbiter.sub_role_history().previous_distinct(), SubRole::Stopper);
}

#[test]
fn role_change_commits_sub_role_immediately() {
    let config = PlaybookConfig {
        team_size: 3,
        ..PlaybookConfig::default()
    };
    let mut robot = Robot::with_config(2, config);
    robot.place(point![-2.0, 0.0]);
    let ball = point![1.0, 0.5];
    robot.ball_at(ball);

    robot.tick(vec![packet(3, ball, ball)]);
    assert_eq!(robot.arbiter.my_role(), Role::Defender);

    let penalized = TeamPacket {
        penalized: true,
        ..packet(3, ball, ball)
    };
    robot.tick(vec![penalized]);

    assert_eq!(robot.arbiter.my_strategy(), Strategy::NoFieldPlayers);
    assert_eq!(robot.arbiter.my_role(), Role::Chaser);
    assert_eq!(robot.arbiter.my_sub_role(), SubRole::ChaseNormal);
}

#[test]
fn penalized_robot_takes_penalty_role() {
    let mut robot = Robot::new(2);
    robot.primary_state = PrimaryState::Penalized;

    let packet = robot.tick(Vec::new());

    assert_eq!(robot.arbiter.my_strategy(), Strategy::Penalized);
    assert_eq!(robot.arbiter.my_formation(), Formation::Penalty);
    assert_eq!(robot.arbiter.my_role(), Role::Penalty);
    assert!(packet.penalized);
    assert_eq!(packet.role, Role::Penalty);
}

#[test]
fn ready_positions_come_from_layout() {
    let mut robot = Robot::new(3);
    robot.primary_state = PrimaryState::Ready;

    robot.tick(Vec::new());

    assert_eq!(robot.arbiter.my_strategy(), Strategy::Ready);
    assert_eq!(robot.arbiter.my_sub_role(), SubRole::ReadyChaser);
    assert_eq!(robot.arbiter.my_position().position, point![-1.2, 0.0]);
}

#[test]
fn goalie_chases_ball_in_its_box() {
    let mut robot = Robot::new(1);
    robot.ball_at(point![-4.0, 0.2]);

    robot.tick(Vec::new());

    assert_eq!(robot.arbiter.my_strategy(), Strategy::Goalie);
    assert_eq!(robot.arbiter.my_sub_role(), SubRole::GoalieChaser);
    assert!(robot.arbiter.is_chaser());

    robot.ball_at(point![0.0, 0.0]);
    for _ in 0..=robot.config.chase.sub_role_switch_buffer {
        robot.tick(Vec::new());
    }
    assert_eq!(robot.arbiter.my_sub_role(), SubRole::GoalieNormal);
    assert!(!robot.arbiter.is_chaser());
}

#[test]
fn team_searches_when_nobody_sees_the_ball() {
    let mut robot = Robot::new(2);
    let unseen = |number, position: Point2<f32>| TeamPacket {
        ball_on: false,
        visual_ball_distance: None,
        ..packet(number, position, Point2::origin())
    };

    while robot.now() <= robot.config.finder_time {
        robot.tick(vec![
            unseen(3, point![0.0, 1.0]),
            unseen(4, point![0.0, -1.0]),
        ]);
        assert_ne!(robot.arbiter.my_formation(), Formation::Finder);
    }
    robot.tick(vec![
        unseen(3, point![0.0, 1.0]),
        unseen(4, point![0.0, -1.0]),
    ]);

    assert_eq!(robot.arbiter.my_formation(), Formation::Finder);
    assert_eq!(robot.arbiter.my_role(), Role::Searcher);
}

#[test]
fn kickoff_formation_ends_after_kickoff_time() {
    let mut robot = Robot::new(3);
    robot.our_kick_off = true;
    robot.sees_ball(point![0.5, 0.0]);

    robot.tick(Vec::new());
    assert_eq!(robot.arbiter.my_strategy(), Strategy::Kickoff);
    assert_eq!(robot.arbiter.my_formation(), Formation::OneKickoff);
    assert_eq!(robot.arbiter.my_sub_role(), SubRole::KickoffStriker);

    while robot.now() < robot.config.kickoff_formation_time {
        robot.tick(Vec::new());
    }
    robot.tick(Vec::new());
    assert_eq!(robot.arbiter.my_strategy(), Strategy::NoFieldPlayers);
}

#[test]
fn kickoff_formation_does_not_return_after_a_penalty() {
    let mut robot = Robot::new(3);
    robot.our_kick_off = true;
    robot.sees_ball(point![0.5, 0.0]);

    while robot.now() <= robot.config.kickoff_formation_time {
        robot.tick(Vec::new());
    }
    robot.tick(Vec::new());
    assert_eq!(robot.arbiter.my_strategy(), Strategy::NoFieldPlayers);

    robot.primary_state = PrimaryState::Penalized;
    for _ in 0..100 {
        robot.tick(Vec::new());
    }
    assert_eq!(robot.arbiter.my_strategy(), Strategy::Penalized);

    robot.primary_state = PrimaryState::Playing;
    robot.tick(Vec::new());
    assert_eq!(robot.arbiter.my_strategy(), Strategy::NoFieldPlayers);
}

#[test]
fn kickoff_formation_starts_again_after_set() {
    let mut robot = Robot::new(3);
    robot.our_kick_off = true;
    robot.sees_ball(point![0.5, 0.0]);

    while robot.now() <= robot.config.kickoff_formation_time {
        robot.tick(Vec::new());
    }

    robot.primary_state = PrimaryState::Set;
    robot.tick(Vec::new());
    robot.primary_state = PrimaryState::Playing;
    robot.tick(Vec::new());
    assert_eq!(robot.arbiter.my_strategy(), Strategy::Kickoff);
}

#[test]
fn strange_packets_are_ignored() {
    let mut robot = Robot::new(2);
    robot.sees_ball(point![0.5, 0.0]);
    let ball = robot.ball.field;

    robot.tick(vec![
        packet(0, point![1.0, 1.0], ball),
        packet(2, point![1.0, 1.0], ball),
        packet(9, point![1.0, 1.0], ball),
    ]);

    assert_eq!(robot.arbiter.team().teammate(2).unwrap().position(), point![0.0, 0.0]);
    assert_eq!(robot.arbiter.team().active_field_players(&robot.config).count(), 0);
}

#[test]
fn least_weight_position_minimizes_total_distance() {
    let config = PlaybookConfig::default();
    let mut team = Team::new(2, &config);
    team.teammates[1].pose = Isometry2::translation(0.0, 1.0);
    let mut mate = Teammate::unknown(3);
    mate.pose = Isometry2::translation(0.0, -1.0);

    let positions = [point![0.0, -1.5], point![0.0, 1.5]];

    assert_eq!(team.least_weight_position(&positions, &[&mate]), 1);
    assert_eq!(team.least_weight_position(&positions[..1], &[&mate]), 0);
}

#[test]
fn no_called_chaser_when_teammates_only_defend() {
    let config = PlaybookConfig::default();
    let mut team = Team::new(2, &config);
    let mut mate = Teammate::unknown(3);
    mate.active = true;
    mate.role = Role::Defender;
    team.teammates[2] = mate;

    assert!(team.no_called_chaser(PrimaryState::Playing, &config));
    assert!(!team.no_called_chaser(PrimaryState::Ready, &config));

    team.teammates[2].role = Role::Chaser;
    assert!(!team.no_called_chaser(PrimaryState::Playing, &config));
}
