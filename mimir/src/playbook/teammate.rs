use std::time::Duration;

use nalgebra::{Isometry2, Point2};

use crate::communication::{Possession, TeamPacket};

use super::{
    config::ChaseConfig,
    roles::{Role, SubRole},
};

/// What the robot knows about one player of its team, including itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Teammate {
    pub number: u8,
    pub pose: Isometry2<f32>,
    pub ball: Point2<f32>,
    pub ball_on: bool,
    pub visual_ball_distance: Option<f32>,
    pub loc_ball_distance: f32,
    /// Estimated time to reach the ball, in seconds.
    pub chase_time: f32,
    /// Whether the player takes part in the role assignment.
    pub active: bool,
    /// Role the player claimed in its last packet.
    pub role: Role,
    pub sub_role: SubRole,
    pub possession: Possession,
    pub fallen: bool,
    pub penalized: bool,
    /// Time the last packet of this player was applied.
    pub last_packet: Option<Duration>,
}

impl Teammate {
    /// A player that has not been heard from.
    #[must_use]
    pub fn unknown(number: u8) -> Self {
        Self {
            number,
            pose: Isometry2::identity(),
            ball: Point2::origin(),
            ball_on: false,
            visual_ball_distance: None,
            loc_ball_distance: f32::INFINITY,
            chase_time: f32::INFINITY,
            active: false,
            role: Role::Init,
            sub_role: SubRole::Init,
            possession: Possession::NONE,
            fallen: false,
            penalized: false,
            last_packet: None,
        }
    }

    /// Applies a packet received from this player.
    pub fn apply(&mut self, packet: &TeamPacket, now: Duration, config: &ChaseConfig) {
        self.pose = packet.pose;
        self.ball = packet.ball;
        self.ball_on = packet.ball_on;
        self.visual_ball_distance = packet.visual_ball_distance;
        self.loc_ball_distance = packet.loc_ball_distance;
        self.role = packet.role;
        self.sub_role = packet.sub_role;
        self.possession = packet.possession;
        self.fallen = packet.fallen;
        self.penalized = packet.penalized;
        self.active = !packet.penalized;
        self.last_packet = Some(now);
        self.chase_time = chase_time(self.ball_distance(), self.ball_on, self.fallen, config);
    }

    /// Whether no packet of this player arrived within the `dead_period`.
    #[must_use]
    pub fn is_dead(&self, now: Duration, dead_period: Duration) -> bool {
        self.last_packet
            .is_none_or(|last| now.saturating_sub(last) > dead_period)
    }

    /// Distance to the ball, as seen by vision when possible.
    #[must_use]
    pub fn ball_distance(&self) -> f32 {
        self.visual_ball_distance.unwrap_or(self.loc_ball_distance)
    }

    #[must_use]
    pub fn position(&self) -> Point2<f32> {
        self.pose.translation.vector.into()
    }

    #[must_use]
    pub fn claims_chaser(&self) -> bool {
        self.role == Role::Chaser
    }
}

/// Estimated time for a robot to reach the ball, in seconds.
#[must_use]
pub fn chase_time(ball_distance: f32, ball_on: bool, fallen: bool, config: &ChaseConfig) -> f32 {
    let mut time = ball_distance / config.chase_speed;
    if fallen {
        time += config.fallen_penalty;
    }
    if ball_on {
        time -= config.ball_seen_bonus;
    }

    time.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chase_time_penalizes_fallen_robots() {
        let config = ChaseConfig::default();

        let standing = chase_time(1.0, false, false, &config);
        let fallen = chase_time(1.0, false, true, &config);

        assert!((standing - 5.0).abs() < 1e-6);
        assert!((fallen - standing - config.fallen_penalty).abs() < 1e-6);
    }

    #[test]
    fn chase_time_is_never_negative() {
        let config = ChaseConfig::default();

        assert_eq!(chase_time(0.0, true, false, &config), 0.0);
    }

    #[test]
    fn silent_teammate_is_dead() {
        let mut mate = Teammate::unknown(2);
        assert!(mate.is_dead(Duration::ZERO, Duration::from_secs(5)));

        mate.last_packet = Some(Duration::from_secs(1));
        assert!(!mate.is_dead(Duration::from_secs(6), Duration::from_secs(5)));
        assert!(mate.is_dead(Duration::from_millis(6001), Duration::from_secs(5)));
    }
}
