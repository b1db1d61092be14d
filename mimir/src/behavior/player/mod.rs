//! What the robot does with its role: chase and kick the ball, or walk to its position.

mod chase;
mod kicking;
mod position;

use std::time::Duration;

use bevy::{ecs::system::SystemParam, prelude::*};
use colored::Color;
use norn::{Frame, StateMachine, Transition};
use strum::{Display, EnumIter};
use tracing::info;

use crate::{
    ball::Ball,
    communication::Possession,
    config::LayoutConfig,
    cycle::FrameTime,
    localization::{LocalizationQuality, RobotPose},
    motion::{
        MotionStatus,
        sequence::{MotionLibrary, MotionSequence, SequenceQueue},
    },
    navigation::{NavContext, Navigator, NavigatorConfig},
    playbook::RoleArbiter,
    primary_state::PrimaryState,
};

use super::{BehaviorConfig, BehaviorSet, FallMonitor, HeadTracker};

pub(super) struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_player)
            .add_systems(Update, play.in_set(BehaviorSet::Player));
    }
}

fn setup_player(mut commands: Commands) {
    commands.insert_resource(Player::new().expect("failed to create player"));
}

/// Everything the player reads from the rest of the robot.
#[derive(SystemParam)]
struct Observations<'w> {
    time: Res<'w, FrameTime>,
    primary_state: Res<'w, PrimaryState>,
    fall: Res<'w, FallMonitor>,
    ball: Res<'w, Ball>,
    pose: Res<'w, RobotPose>,
    quality: Res<'w, LocalizationQuality>,
    motion: Res<'w, MotionStatus>,
    arbiter: Res<'w, RoleArbiter>,
    layout: Res<'w, LayoutConfig>,
    library: Res<'w, MotionLibrary>,
    config: Res<'w, BehaviorConfig>,
    nav_config: Res<'w, NavigatorConfig>,
}

fn play(
    mut player: ResMut<Player>,
    mut navigator: ResMut<Navigator>,
    mut head: ResMut<HeadTracker>,
    mut sequences: ResMut<SequenceQueue>,
    mut possession: ResMut<Possession>,
    observations: Observations,
) {
    let mut context = PlayerContext {
        now: observations.time.now,
        primary_state: *observations.primary_state,
        fallen: observations.fall.is_recovering(),
        ball: &observations.ball,
        pose: &observations.pose,
        quality: &observations.quality,
        motion: &observations.motion,
        arbiter: &observations.arbiter,
        layout: &observations.layout,
        library: &observations.library,
        config: &observations.config,
        nav_config: &observations.nav_config,
        navigator: &mut navigator,
        head: &mut head,
        sequences: &mut sequences,
    };

    player.run(&mut context);
    *possession = player.possession();
}

/// States of the [`Player`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum PlayerState {
    GameInitial,
    GameReady,
    GameSet,
    GamePlaying,
    GamePenalized,
    GameFinished,

    /// Picks the chase state that fits where the ball is.
    Chase,
    ScanFindBall,
    SpinFindBall,
    TurnToBall,
    ApproachBall,
    ApproachBallWithLoc,
    PositionForKick,
    WaitBeforeKick,
    DecideKick,
    KickBallStraight,
    KickBallLeft,
    KickBallRight,
    SideStepForKick,
    StepLeftForKick,
    StepRightForKick,
    KickBallExecute,
    AfterKick,

    PlaybookPosition,
    AtPosition,
}

impl PlayerState {
    /// The state the player enters when the match changes to `primary_state`.
    #[must_use]
    pub fn for_game(primary_state: PrimaryState) -> Self {
        match primary_state {
            PrimaryState::Initial => PlayerState::GameInitial,
            PrimaryState::Ready => PlayerState::GameReady,
            PrimaryState::Set => PlayerState::GameSet,
            PrimaryState::Playing => PlayerState::GamePlaying,
            PrimaryState::Penalized => PlayerState::GamePenalized,
            PrimaryState::Finished => PlayerState::GameFinished,
        }
    }
}

/// Which foot the ball lies in front of.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display)]
pub enum BallFoot {
    Left,
    MidLeft,
    MidRight,
    Right,
    /// In front of neither foot.
    #[default]
    Incorrect,
}

/// Everything the player reads and commands in a frame.
pub struct PlayerContext<'a> {
    pub now: Duration,
    pub primary_state: PrimaryState,
    /// Whether the robot is recovering from a fall.
    pub fallen: bool,
    pub ball: &'a Ball,
    pub pose: &'a RobotPose,
    pub quality: &'a LocalizationQuality,
    pub motion: &'a MotionStatus,
    pub arbiter: &'a RoleArbiter,
    pub layout: &'a LayoutConfig,
    pub library: &'a MotionLibrary,
    pub config: &'a BehaviorConfig,
    pub nav_config: &'a NavigatorConfig,
    pub navigator: &'a mut Navigator,
    pub head: &'a mut HeadTracker,
    pub sequences: &'a mut SequenceQueue,
}

impl PlayerContext<'_> {
    fn nav(&self) -> NavContext<'_> {
        NavContext {
            pose: self.pose,
            quality: self.quality,
            motion: self.motion,
            config: self.nav_config,
        }
    }

    fn set_speed(&mut self, forward: f32, left: f32, turn: f32) {
        self.navigator.set_speed(forward, left, turn, self.nav_config);
    }
}

pub(crate) type PlayerHandler =
    fn(&mut Agent, &Frame<PlayerState>, &mut PlayerContext<'_>) -> Transition<PlayerState>;

/// Bookkeeping of the player that its states share.
#[derive(Debug, Default, Clone)]
pub(crate) struct Agent {
    primary_state: PrimaryState,
    /// Whether the robot was chasing when its role was last looked at.
    chasing: bool,
    fallen: bool,
    chosen_kick: Option<MotionSequence>,
    ball_foot: BallFoot,
    /// Frames the preferred movement mode has differed from the one in use.
    change_omni: u32,
    not_at_position: u32,
}

/// The state machine that turns the role of the robot into navigator goals and kicks.
#[derive(Resource, Debug, Clone)]
pub struct Player {
    machine: StateMachine<PlayerState, PlayerHandler>,
    agent: Agent,
}

impl Player {
    pub fn new() -> norn::Result<Self> {
        use PlayerState as P;

        let machine = StateMachine::<PlayerState, PlayerHandler>::builder("player")
            .color(Color::Green)
            .state(P::GameInitial, game_initial)
            .state(P::GameReady, game_ready)
            .state(P::GameSet, game_set)
            .state(P::GamePlaying, game_playing)
            .state(P::GamePenalized, game_penalized)
            .state(P::GameFinished, game_initial)
            .state(P::Chase, chase::chase)
            .state(P::ScanFindBall, chase::scan_find_ball)
            .state(P::SpinFindBall, chase::spin_find_ball)
            .state(P::TurnToBall, chase::turn_to_ball)
            .state(P::ApproachBall, chase::approach_ball)
            .state(P::ApproachBallWithLoc, chase::approach_ball_with_loc)
            .state(P::PositionForKick, chase::position_for_kick)
            .state(P::WaitBeforeKick, chase::wait_before_kick)
            .state(P::DecideKick, kicking::decide_kick)
            .state(P::KickBallStraight, kicking::kick_ball_straight)
            .state(P::KickBallLeft, kicking::kick_ball_left)
            .state(P::KickBallRight, kicking::kick_ball_right)
            .state(P::SideStepForKick, kicking::side_step_for_kick)
            .state(P::StepLeftForKick, kicking::step_for_kick)
            .state(P::StepRightForKick, kicking::step_for_kick)
            .state(P::KickBallExecute, kicking::kick_ball_execute)
            .state(P::AfterKick, kicking::after_kick)
            .state(P::PlaybookPosition, position::playbook_position)
            .state(P::AtPosition, position::at_position)
            .build(P::GameInitial)?;

        Ok(Self {
            machine,
            agent: Agent::default(),
        })
    }

    /// Runs the player for one frame.
    ///
    /// A change of the primary state restarts the player in the matching game state, a change
    /// between chasing and positioning while playing switches to the other family of states.
    /// Nothing runs while the robot gets up after a fall.
    pub fn run(&mut self, context: &mut PlayerContext<'_>) {
        if context.fallen {
            if !self.agent.fallen {
                info!("fallen, waiting to get up");
            }
            self.agent.fallen = true;
            context.navigator.stop();
            return;
        }

        let chasing = context.arbiter.is_chaser();
        if self.agent.fallen || context.primary_state != self.agent.primary_state {
            self.agent.fallen = false;
            self.agent.primary_state = context.primary_state;
            self.agent.chasing = chasing;
            self.machine.ensure(PlayerState::for_game(context.primary_state));
        } else if context.primary_state == PrimaryState::Playing && chasing != self.agent.chasing
        {
            self.agent.chasing = chasing;
            self.machine.switch_to(if chasing {
                PlayerState::Chase
            } else {
                PlayerState::PlaybookPosition
            });
        }

        self.machine.run(context.now, |handler, frame| {
            handler(&mut self.agent, frame, context)
        });
    }

    #[must_use]
    pub fn state(&self) -> PlayerState {
        self.machine.current()
    }

    /// The kick the player has decided on, if any.
    #[must_use]
    pub fn chosen_kick(&self) -> Option<MotionSequence> {
        self.agent.chosen_kick
    }

    #[must_use]
    pub fn ball_foot(&self) -> BallFoot {
        self.agent.ball_foot
    }

    /// Whether the robot is in control of the ball.
    #[must_use]
    pub fn possession(&self) -> Possession {
        Possession {
            kicking: self.machine.is(PlayerState::KickBallExecute),
            ..Possession::NONE
        }
    }
}

type Next = Transition<PlayerState>;

fn game_initial(
    _: &mut Agent,
    frame: &Frame<PlayerState>,
    context: &mut PlayerContext<'_>,
) -> Next {
    if frame.first_frame {
        context.navigator.stop();
        context.head.stop();
    }

    Transition::Stay
}

fn game_ready(_: &mut Agent, _: &Frame<PlayerState>, _: &mut PlayerContext<'_>) -> Next {
    Transition::SwitchNow(PlayerState::PlaybookPosition)
}

fn game_set(_: &mut Agent, frame: &Frame<PlayerState>, context: &mut PlayerContext<'_>) -> Next {
    if frame.first_frame {
        context.navigator.stop();
        context.head.track_ball();
    }

    Transition::Stay
}

fn game_playing(agent: &mut Agent, _: &Frame<PlayerState>, _: &mut PlayerContext<'_>) -> Next {
    if agent.chasing {
        Transition::SwitchNow(PlayerState::Chase)
    } else {
        Transition::SwitchNow(PlayerState::PlaybookPosition)
    }
}

fn game_penalized(
    _: &mut Agent,
    frame: &Frame<PlayerState>,
    context: &mut PlayerContext<'_>,
) -> Next {
    if frame.first_frame {
        context.navigator.stop();
        context.head.loc_pans();
    }

    Transition::Stay
}

#[cfg(test)]
mod tests;
