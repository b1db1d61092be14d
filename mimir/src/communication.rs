//! Messages exchanged with teammates over the team radio.
//!
//! The radio itself is not part of the decision core, it pushes every packet it receives into
//! the [`TeamInbox`] and broadcasts whatever is left in the [`TeamOutbox`]. The player keeps the
//! [`Possession`] resource up to date, it ends up in the outgoing packet.

use bevy::prelude::*;
use nalgebra::{Isometry2, Point2};

use crate::playbook::{Role, SubRole};

/// Plugin providing the [`TeamInbox`], [`TeamOutbox`] and [`Possession`] resources.
pub struct CommunicationPlugin;

impl Plugin for CommunicationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TeamInbox>()
            .init_resource::<TeamOutbox>()
            .init_resource::<Possession>();
    }
}

/// Whether a robot is in control of the ball.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Possession {
    pub grabbing: bool,
    pub dribbling: bool,
    pub kicking: bool,
}

impl Possession {
    pub const NONE: Self = Self {
        grabbing: false,
        dribbling: false,
        kicking: false,
    };

    #[must_use]
    pub fn has_ball(&self) -> bool {
        self.grabbing || self.dribbling || self.kicking
    }
}

/// The state a robot shares with its teammates every cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamPacket {
    pub player_number: u8,
    /// Pose of the robot on the field.
    pub pose: Isometry2<f32>,
    /// Filtered position of the ball on the field.
    pub ball: Point2<f32>,
    /// Whether the robot sees the ball.
    pub ball_on: bool,
    /// Distance to the ball as seen by vision, if the robot sees the ball.
    pub visual_ball_distance: Option<f32>,
    /// Distance to the filtered ball estimate.
    pub loc_ball_distance: f32,
    /// Estimated time for the robot to reach the ball, in seconds.
    pub chase_time: f32,
    pub role: Role,
    pub sub_role: SubRole,
    pub possession: Possession,
    pub fallen: bool,
    pub penalized: bool,
}

/// Packets received since the last cycle.
#[derive(Resource, Debug, Default, Clone)]
pub struct TeamInbox(Vec<TeamPacket>);

impl TeamInbox {
    pub fn push(&mut self, packet: TeamPacket) {
        self.0.push(packet);
    }

    /// Takes all received packets in order of arrival.
    pub fn drain(&mut self) -> impl Iterator<Item = TeamPacket> + '_ {
        self.0.drain(..)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The packet to broadcast this cycle.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct TeamOutbox(pub Option<TeamPacket>);
