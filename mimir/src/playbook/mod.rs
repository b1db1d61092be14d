//! Team coordination.
//!
//! Every frame the [`RoleArbiter`] folds the packets of its teammates into its view of the team,
//! picks a [`Strategy`] for the situation, lets that strategy propose a [`Formation`] and a
//! [`SubRole`] for this robot, and commits the proposal with some hysteresis. The position that
//! belongs to the committed sub-role is what the player walks to.

mod chaser;
mod config;
mod formations;
mod positions;
mod roles;
mod strategies;
mod teammate;
mod tracked;

use std::time::Duration;

use bevy::prelude::*;
use colored::Color;
use itertools::Itertools;
use nalgebra::Point2;
use norn::{Frame, StateMachine, Transition};
use tracing::{debug, info, warn};

use crate::{
    ball::Ball,
    behavior::{BehaviorSet, FallMonitor},
    communication::{Possession, TeamInbox, TeamOutbox, TeamPacket},
    config::{LayoutConfig, PlayerConfig},
    cycle::FrameTime,
    game_controller::GameSignal,
    localization::RobotPose,
    navigation::Target,
    primary_state::PrimaryState,
};

pub use chaser::{Candidate, elect};
pub use config::{ChaseConfig, PlaybookConfig, PositionsConfig};
pub use roles::{Assignment, Formation, Role, Strategy, SubRole};
pub use teammate::{Teammate, chase_time};
pub use tracked::{OnDeck, Tracked};

/// Plugin that adds the [`RoleArbiter`] and runs it every frame.
pub struct PlaybookPlugin;

impl Plugin for PlaybookPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_role_arbiter)
            .add_systems(Update, run_playbook.in_set(BehaviorSet::Playbook));
    }
}

fn setup_role_arbiter(
    mut commands: Commands,
    player: Res<PlayerConfig>,
    config: Res<PlaybookConfig>,
) {
    commands.insert_resource(
        RoleArbiter::new(player.player_number, &config).expect("failed to create role arbiter"),
    );
}

#[allow(clippy::too_many_arguments)]
fn run_playbook(
    mut arbiter: ResMut<RoleArbiter>,
    mut inbox: ResMut<TeamInbox>,
    mut outbox: ResMut<TeamOutbox>,
    time: Res<FrameTime>,
    primary_state: Res<PrimaryState>,
    signal: Res<GameSignal>,
    pose: Res<RobotPose>,
    ball: Res<Ball>,
    possession: Res<Possession>,
    fall: Res<FallMonitor>,
    config: Res<PlaybookConfig>,
    layout: Res<LayoutConfig>,
) {
    let context = StrategyContext {
        now: time.now,
        primary_state: *primary_state,
        our_kick_off: signal.our_kick_off,
        pose: &pose,
        ball: &ball,
        possession: *possession,
        fallen: fall.is_recovering(),
        config: &config,
        layout: &layout,
    };

    let packets: Vec<TeamPacket> = inbox.drain().collect();
    outbox.0 = Some(arbiter.run(&context, packets));
}

/// Everything the arbiter reads from the rest of the robot in a frame.
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    pub now: Duration,
    pub primary_state: PrimaryState,
    pub our_kick_off: bool,
    pub pose: &'a RobotPose,
    pub ball: &'a Ball,
    /// Whether this robot is in control of the ball.
    pub possession: Possession,
    /// Whether this robot is recovering from a fall.
    pub fallen: bool,
    pub config: &'a PlaybookConfig,
    pub layout: &'a LayoutConfig,
}

pub(crate) type StrategyHandler =
    fn(&mut Team, &Frame<Strategy>, &StrategyContext<'_>) -> Transition<Strategy>;

/// The view of the team the strategies work on.
#[derive(Debug, Clone)]
pub struct Team {
    me: u8,
    /// One record per player, player `n` at index `n - 1`. My own record is kept up to date
    /// locally.
    teammates: Vec<Teammate>,
    proposal: Assignment,
    strategy: Tracked<Strategy>,
    formation: Tracked<Formation>,
    role: Tracked<Role>,
    sub_role: Tracked<SubRole>,
    on_deck: OnDeck<SubRole>,
    position: Target,
    /// Last time any active player of the team saw the ball.
    last_ball_seen: Duration,
    /// Start of play, kept through penalties.
    playing_since: Option<Duration>,
}

impl Team {
    fn new(me: u8, config: &PlaybookConfig) -> Self {
        let players = config.team_size.max(me);

        Self {
            me,
            teammates: (1..=players).map(Teammate::unknown).collect(),
            proposal: Assignment::default(),
            strategy: Tracked::new(Strategy::Init),
            formation: Tracked::new(Formation::Init),
            role: Tracked::new(Role::Init),
            sub_role: Tracked::new(SubRole::Init),
            on_deck: OnDeck::default(),
            position: Target::default(),
            last_ball_seen: Duration::ZERO,
            playing_since: None,
        }
    }

    fn index(number: u8) -> Option<usize> {
        usize::from(number).checked_sub(1)
    }

    /// My own record.
    #[must_use]
    pub fn me(&self) -> &Teammate {
        &self.teammates[usize::from(self.me) - 1]
    }

    fn me_mut(&mut self) -> &mut Teammate {
        let index = usize::from(self.me) - 1;
        &mut self.teammates[index]
    }

    /// The record of player `number`.
    #[must_use]
    pub fn teammate(&self, number: u8) -> Option<&Teammate> {
        Self::index(number).and_then(|index| self.teammates.get(index))
    }

    fn is_field_player(teammate: &Teammate, config: &PlaybookConfig) -> bool {
        teammate.number != config.goalie_number
    }

    #[must_use]
    pub fn is_goalie(&self, config: &PlaybookConfig) -> bool {
        self.me == config.goalie_number
    }

    #[must_use]
    pub fn goalie_active(&self, config: &PlaybookConfig) -> bool {
        self.teammate(config.goalie_number)
            .is_some_and(|goalie| goalie.active)
    }

    /// Active field players other than me.
    pub fn active_field_players<'a>(
        &'a self,
        config: &'a PlaybookConfig,
    ) -> impl Iterator<Item = &'a Teammate> + 'a {
        self.teammates.iter().filter(move |mate| {
            mate.number != self.me && mate.active && Self::is_field_player(mate, config)
        })
    }

    /// Number of field players other than me that do not take part in the game.
    #[must_use]
    pub fn inactive_field_players(&self, config: &PlaybookConfig) -> usize {
        self.teammates
            .iter()
            .filter(|mate| {
                mate.number != self.me && !mate.active && Self::is_field_player(mate, config)
            })
            .count()
    }

    /// Whether a teammate other than me is in control of the ball.
    #[must_use]
    pub fn teammate_has_ball(&self) -> bool {
        self.teammates
            .iter()
            .any(|mate| mate.number != self.me && mate.active && mate.possession.has_ball())
    }

    /// Whether no active teammate is chasing or searching for the ball.
    #[must_use]
    pub fn no_called_chaser(&self, primary_state: PrimaryState, config: &PlaybookConfig) -> bool {
        if self.active_field_players(config).next().is_none() {
            return false;
        }
        if matches!(primary_state, PrimaryState::Ready | PrimaryState::Set) {
            return false;
        }

        !self.teammates.iter().any(|mate| {
            mate.number != self.me
                && mate.active
                && matches!(mate.role, Role::Chaser | Role::Searcher)
        })
    }

    /// Time since any active player of the team last saw the ball.
    #[must_use]
    pub fn ball_unseen_for(&self, now: Duration) -> Duration {
        now.saturating_sub(self.last_ball_seen)
    }

    /// Time since play started, if the match is being played.
    #[must_use]
    pub fn playing_for(&self, now: Duration) -> Option<Duration> {
        self.playing_since.map(|since| now.saturating_sub(since))
    }

    fn candidate(&self, mate: &Teammate) -> Candidate {
        let was_chaser = if mate.number == self.me {
            self.role.current() == Role::Chaser
        } else {
            mate.claims_chaser()
        };

        Candidate {
            number: mate.number,
            chase_time: mate.chase_time,
            was_chaser,
            claims_chaser: mate.claims_chaser(),
            has_ball: mate.possession.has_ball(),
        }
    }

    /// Number of the field player that should chase the ball, possibly my own.
    #[must_use]
    pub fn determine_chaser(&self, config: &PlaybookConfig) -> u8 {
        let me = self.me();
        let others = self
            .active_field_players(config)
            .filter(|mate| {
                let both_see_ball = mate.ball_on && me.ball_on;
                !both_see_ball || (mate.ball.y - me.ball.y).abs() <= config.chase.ball_disagreement
            })
            .map(|mate| self.candidate(mate))
            .collect_vec();

        let chaser = elect(&self.candidate(me), others, &config.chase);
        debug!(chaser, "determined chaser");
        chaser
    }

    /// Index of the position I should take such that the robots together walk the least.
    ///
    /// `mates` are the other robots that take one of `positions`, every robot takes one.
    /// Equal total distances go to the first assignment in lexicographic order, which every
    /// robot computes the same way.
    #[must_use]
    pub fn least_weight_position(&self, positions: &[Point2<f32>], mates: &[&Teammate]) -> usize {
        if positions.len() <= 1 {
            return 0;
        }

        let mut robots = mates
            .iter()
            .map(|mate| (mate.number, mate.position()))
            .sorted_by_key(|(number, _)| *number)
            .take(positions.len() - 1)
            .collect_vec();
        robots.push((self.me, self.me().position()));
        robots.sort_by_key(|(number, _)| *number);

        let Some(my_index) = robots.iter().position(|(number, _)| *number == self.me) else {
            return 0;
        };

        let mut best: Option<(f32, Vec<usize>)> = None;
        for assignment in (0..positions.len()).permutations(robots.len()) {
            let cost: f32 = assignment
                .iter()
                .zip(&robots)
                .map(|(slot, (_, position))| (positions[*slot] - position).norm())
                .sum();

            if best.as_ref().is_none_or(|(best_cost, _)| cost < *best_cost) {
                best = Some((cost, assignment));
            }
        }

        best.map_or(0, |(_, assignment)| assignment[my_index])
    }

    fn propose(&mut self, assignment: Assignment) {
        self.proposal = assignment;
    }

    /// Folds the received packets and my own observations into the team records.
    fn update_before(
        &mut self,
        context: &StrategyContext<'_>,
        packets: impl IntoIterator<Item = TeamPacket>,
    ) {
        let now = context.now;
        let config = context.config;

        for packet in packets {
            if packet.player_number == self.me {
                warn!("ignoring team packet carrying my own player number");
                continue;
            }

            let Some(mate) = Self::index(packet.player_number)
                .and_then(|index| self.teammates.get_mut(index))
            else {
                warn!(
                    player_number = packet.player_number,
                    "ignoring team packet of unknown player"
                );
                continue;
            };
            mate.apply(&packet, now, &config.chase);
        }

        self.update_me(context);

        let me = self.me;
        for mate in &mut self.teammates {
            if mate.number != me && mate.active && mate.is_dead(now, config.packet_dead_period) {
                debug!(player_number = mate.number, "teammate went silent");
                mate.active = false;
            }
        }

        let playing = context.primary_state == PrimaryState::Playing;
        if !playing || self.teammates.iter().any(|mate| mate.active && mate.ball_on) {
            self.last_ball_seen = now;
        }

        // a penalty does not interrupt the match, the kick-off clock keeps running
        match context.primary_state {
            PrimaryState::Playing | PrimaryState::Penalized => {
                self.playing_since.get_or_insert(now);
            }
            PrimaryState::Initial
            | PrimaryState::Ready
            | PrimaryState::Set
            | PrimaryState::Finished => self.playing_since = None,
        }
    }

    fn update_me(&mut self, context: &StrategyContext<'_>) {
        let ball = context.ball;
        let pose = context.pose;
        let penalized = context.primary_state == PrimaryState::Penalized;
        let role = self.role.current();
        let sub_role = self.sub_role.current();

        let me = self.me_mut();
        me.pose = pose.inner;
        me.ball = ball.field;
        me.ball_on = ball.on;
        me.visual_ball_distance = ball.visual_distance();
        me.loc_ball_distance = ball.loc_distance(pose);
        me.possession = context.possession;
        me.fallen = context.fallen;
        me.penalized = penalized;
        me.active = !penalized;
        me.role = role;
        me.sub_role = sub_role;
        me.last_packet = Some(context.now);
        me.chase_time = chase_time(
            me.ball_distance(),
            me.ball_on,
            me.fallen,
            &context.config.chase,
        );
    }

    /// Commits this frame's proposal and computes my position.
    fn commit(&mut self, strategy: Strategy, context: &StrategyContext<'_>) {
        let now = context.now;
        let proposal = self.proposal;

        self.strategy.update(strategy, now);
        if self.formation.update(proposal.formation, now) {
            info!("formation switched to {}", proposal.formation);
        }

        let role_changed = self.role.update(proposal.role(), now);
        if role_changed {
            info!("role switched to {}", proposal.role());
        }

        let sub_role = self.on_deck.propose(
            self.sub_role.current(),
            proposal.sub_role,
            context.config.chase.sub_role_switch_buffer,
            role_changed,
        );
        if self.sub_role.update(sub_role, now) {
            info!("sub-role switched to {sub_role}");
        }

        assert_eq!(
            self.sub_role.current().role(),
            self.role.current(),
            "sub-role {} does not belong to role {}",
            self.sub_role.current(),
            self.role.current()
        );

        self.position = positions::position(self.sub_role.current(), self.me, context);
    }

    /// The packet to send to my teammates.
    fn update_after(&mut self) -> TeamPacket {
        let role = self.role.current();
        let sub_role = self.sub_role.current();
        let me = self.me_mut();
        me.role = role;
        me.sub_role = sub_role;

        TeamPacket {
            player_number: me.number,
            pose: me.pose,
            ball: me.ball,
            ball_on: me.ball_on,
            visual_ball_distance: me.visual_ball_distance,
            loc_ball_distance: me.loc_ball_distance,
            chase_time: me.chase_time,
            role,
            sub_role,
            possession: me.possession,
            fallen: me.fallen,
            penalized: me.penalized,
        }
    }
}

/// Decides the strategy of the team and the role of this robot within it.
#[derive(Resource, Debug, Clone)]
pub struct RoleArbiter {
    machine: StateMachine<Strategy, StrategyHandler>,
    team: Team,
}

impl RoleArbiter {
    pub fn new(player_number: u8, config: &PlaybookConfig) -> norn::Result<Self> {
        use Strategy as S;

        let machine = StateMachine::<Strategy, StrategyHandler>::builder("playbook")
            .color(Color::Magenta)
            .state(S::Init, strategies::init)
            .state(S::Penalized, strategies::penalized)
            .state(S::Ready, strategies::ready)
            .state(S::Goalie, strategies::goalie)
            .state(S::Kickoff, strategies::kickoff)
            .state(S::Spread, strategies::spread)
            .state(S::OneDown, strategies::one_down)
            .state(S::NoFieldPlayers, strategies::no_field_players)
            .state(S::TestDefender, strategies::test_defender)
            .state(S::TestOffender, strategies::test_offender)
            .state(S::TestChaser, strategies::test_chaser)
            .build(S::Init)?;

        Ok(Self {
            machine,
            team: Team::new(player_number.max(1), config),
        })
    }

    /// Runs the arbiter for one frame, returns the packet to broadcast.
    pub fn run(
        &mut self,
        context: &StrategyContext<'_>,
        packets: impl IntoIterator<Item = TeamPacket>,
    ) -> TeamPacket {
        self.team.update_before(context, packets);
        self.machine.run(context.now, |handler, frame| {
            handler(&mut self.team, frame, context)
        });
        self.team.commit(self.machine.current(), context);
        self.team.update_after()
    }

    #[must_use]
    pub fn team(&self) -> &Team {
        &self.team
    }

    #[must_use]
    pub fn my_strategy(&self) -> Strategy {
        self.team.strategy.current()
    }

    #[must_use]
    pub fn my_formation(&self) -> Formation {
        self.team.formation.current()
    }

    #[must_use]
    pub fn my_role(&self) -> Role {
        self.team.role.current()
    }

    #[must_use]
    pub fn my_sub_role(&self) -> SubRole {
        self.team.sub_role.current()
    }

    /// Where the committed sub-role wants me to be.
    #[must_use]
    pub fn my_position(&self) -> Target {
        self.team.position
    }

    /// History of my role.
    #[must_use]
    pub fn role_history(&self) -> &Tracked<Role> {
        &self.team.role
    }

    #[must_use]
    pub fn sub_role_history(&self) -> &Tracked<SubRole> {
        &self.team.sub_role
    }

    /// Whether I should go for the ball.
    #[must_use]
    pub fn is_chaser(&self) -> bool {
        self.my_role() == Role::Chaser || self.my_sub_role() == SubRole::GoalieChaser
    }
}

#[cfg(test)]
mod tests;
