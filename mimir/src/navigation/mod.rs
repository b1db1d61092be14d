//! Goal directed walking.
//!
//! The [`Navigator`] turns a target pose into walk commands for the walking engine. Depending on
//! the [`MovementMode`] it spins towards the target, walks to it and spins to the final heading,
//! walks to it without turning along one of four directions, or blends all three velocities.

mod config;
mod states;

use std::time::Duration;

use bevy::prelude::*;
use colored::Color;
use nalgebra::Point2;
use norn::{Frame, StateMachine, Transition};
use strum::{Display, EnumIter};

use crate::{
    behavior::BehaviorSet,
    cycle::FrameTime,
    localization::{LocalizationQuality, RobotPose},
    motion::{MotionCommand, MotionRequest, MotionStatus, StepCommand, WalkCommand},
};

pub use config::NavigatorConfig;

/// Plugin that adds the [`Navigator`] and the systems that run it and hand its commands to the
/// walking engine.
pub struct NavigatorPlugin;

impl Plugin for NavigatorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_navigator)
            .add_systems(Update, navigate.in_set(BehaviorSet::Navigation))
            .add_systems(Update, dispatch_motion.in_set(BehaviorSet::Dispatch));
    }
}

fn setup_navigator(mut commands: Commands) {
    commands.insert_resource(Navigator::new().expect("failed to create navigator"));
}

fn navigate(
    mut navigator: ResMut<Navigator>,
    time: Res<FrameTime>,
    pose: Res<RobotPose>,
    quality: Res<LocalizationQuality>,
    motion: Res<MotionStatus>,
    config: Res<NavigatorConfig>,
) {
    let context = NavContext {
        pose: &pose,
        quality: &quality,
        motion: &motion,
        config: &config,
    };

    navigator.run(time.now, &context);
}

fn dispatch_motion(mut navigator: ResMut<Navigator>, mut request: ResMut<MotionRequest>) {
    request.0 = navigator.take_command();
}

/// A position on the field to walk to, with an optional heading to end in.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Target {
    pub position: Point2<f32>,
    pub rotation: Option<f32>,
}

impl Target {
    #[must_use]
    pub fn new(position: Point2<f32>, rotation: Option<f32>) -> Self {
        Self { position, rotation }
    }
}

/// How the navigator moves towards its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MovementMode {
    /// Spin towards the destination, walk forward to it, then spin to the target heading.
    SpinWalkSpin,
    /// Walk forward, backward or sideways to the destination without changing heading.
    Orthogonal,
    /// Walk and turn at the same time.
    Omni,
}

impl MovementMode {
    /// The state in which the navigator starts pursuing a destination in this mode.
    #[must_use]
    pub fn entry(self) -> NavState {
        match self {
            MovementMode::SpinWalkSpin => NavState::SpinToWalkHeading,
            MovementMode::Orthogonal => NavState::OrthoWalkToPoint,
            MovementMode::Omni => NavState::OmniWalkToPoint,
        }
    }

    /// Whether `state` is one of the states that pursue a destination in this mode.
    #[must_use]
    pub fn pursues_in(self, state: NavState) -> bool {
        use NavState as N;

        match self {
            MovementMode::SpinWalkSpin => matches!(
                state,
                N::SpinToWalkHeading | N::WalkToPoint | N::SpinToFinalHeading
            ),
            MovementMode::Orthogonal => matches!(
                state,
                N::OrthoWalkToPoint
                    | N::OrthoForward
                    | N::OrthoBackward
                    | N::OrthoLeftStrafe
                    | N::OrthoRightStrafe
                    | N::SpinToFinalHeading
            ),
            MovementMode::Omni => state == N::OmniWalkToPoint,
        }
    }
}

/// States of the [`Navigator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum NavState {
    SpinToWalkHeading,
    WalkToPoint,
    SpinToFinalHeading,
    OrthoWalkToPoint,
    OrthoForward,
    OrthoBackward,
    OrthoLeftStrafe,
    OrthoRightStrafe,
    OmniWalkToPoint,
    Walking,
    Stepping,
    Stop,
    Stopped,
}

/// A destination together with the mode used to get there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationGoal {
    pub target: Target,
    pub mode: MovementMode,
}

/// Everything the navigator reads from the rest of the robot in a frame.
#[derive(Debug, Clone, Copy)]
pub struct NavContext<'a> {
    pub pose: &'a RobotPose,
    pub quality: &'a LocalizationQuality,
    pub motion: &'a MotionStatus,
    pub config: &'a NavigatorConfig,
}

impl NavContext<'_> {
    /// Whether the localization is certain enough to trust the pose estimate.
    #[must_use]
    pub fn localized(&self) -> bool {
        self.quality.uncertainty <= self.config.max_loc_uncertainty
    }

    /// Whether the robot is within the heading tolerance of `heading`.
    ///
    /// Always false while the localization is too uncertain to trust the heading estimate.
    #[must_use]
    pub fn at_heading(&self, heading: f32) -> bool {
        self.localized() && self.pose.heading_error(heading).abs() < self.config.close_enough_heading
    }

    /// Whether the robot is clearly off `heading`.
    ///
    /// Always false while the localization is too uncertain to trust the heading estimate.
    #[must_use]
    pub fn not_at_heading(&self, heading: f32) -> bool {
        self.localized()
            && self.pose.heading_error(heading).abs() > self.config.almost_close_enough_heading
    }

    #[must_use]
    pub fn at_destination(&self, position: &Point2<f32>) -> bool {
        self.pose.distance_to(position) < self.config.close_enough_xy
    }

    #[must_use]
    pub fn at_destination_closer(&self, position: &Point2<f32>) -> bool {
        self.pose.distance_to(position) < self.config.closer_xy
    }

    /// World heading that points the robot at `position`.
    #[must_use]
    pub fn heading_towards(&self, position: &Point2<f32>) -> f32 {
        let offset = position - self.pose.world_position();
        if offset.norm_squared() == 0.0 {
            return self.pose.world_rotation();
        }
        offset.y.atan2(offset.x)
    }
}

/// Direction of a spin, positive turns are counter clockwise.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Spin {
    #[default]
    Left,
    Right,
}

impl Spin {
    /// The direction that reduces `heading_error` the quickest.
    #[must_use]
    pub fn towards(heading_error: f32) -> Self {
        if heading_error < 0.0 {
            Spin::Right
        } else {
            Spin::Left
        }
    }

    #[must_use]
    pub fn sign(self) -> f32 {
        match self {
            Spin::Left => 1.0,
            Spin::Right => -1.0,
        }
    }
}

pub(crate) type NavHandler =
    fn(&mut Walker, &Frame<NavState>, &NavContext<'_>) -> Transition<NavState>;

/// Bookkeeping of the navigator that its states share.
#[derive(Debug, Default, Clone)]
pub struct Walker {
    goal: Option<NavigationGoal>,
    /// The walk velocity last sent to the walking engine.
    walk: WalkCommand,
    /// Velocity requested with [`Navigator::set_speed`].
    requested: WalkCommand,
    steps: StepCommand,
    command: Option<MotionCommand>,
    no_walk_set: bool,
    /// Frames the exit condition of the current state has held.
    sure: u32,
    /// Frames the secondary exit condition of the current state has held.
    sure_other: u32,
    spin: Spin,
    spin_change_frames: u32,
    switch_ortho: u32,
}

impl Walker {
    fn send_walk(&mut self, forward: f32, left: f32, turn: f32) {
        let walk = WalkCommand::new(forward, left, turn);
        self.walk = walk;
        self.command = Some(MotionCommand::Walk(walk));
    }

    fn stop_walking(&mut self) {
        self.send_walk(0.0, 0.0, 0.0);
    }

    fn send_steps(&mut self) {
        self.walk = WalkCommand::ZERO;
        self.command = Some(MotionCommand::Step(self.steps));
    }

    fn reset_spin(&mut self, heading_error: f32) {
        self.spin = Spin::towards(heading_error);
        self.spin_change_frames = 0;
    }

    /// Spin direction for `heading_error`, changing direction only after the other one has been
    /// preferred for long enough.
    fn spin_direction(&mut self, heading_error: f32, config: &NavigatorConfig) -> Spin {
        if Spin::towards(heading_error) == self.spin {
            self.spin_change_frames = 0;
        } else {
            self.spin_change_frames += 1;
            if self.spin_change_frames > config.change_spin_dir_thresh {
                self.spin = Spin::towards(heading_error);
                self.spin_change_frames = 0;
            }
        }

        self.spin
    }

    /// Counts the frames `condition` holds in a row.
    fn sure(counter: &mut u32, condition: bool) -> u32 {
        if condition {
            *counter += 1;
        } else {
            *counter = 0;
        }
        *counter
    }
}

/// Goal pursuit state machine, the only component that sends walk commands.
#[derive(Resource, Debug, Clone)]
pub struct Navigator {
    machine: StateMachine<NavState, NavHandler>,
    walker: Walker,
}

impl Navigator {
    pub fn new() -> norn::Result<Self> {
        use NavState as N;

        let machine = StateMachine::<NavState, NavHandler>::builder("navigator")
            .color(Color::Cyan)
            .state(N::SpinToWalkHeading, states::spin_to_walk_heading)
            .state(N::WalkToPoint, states::walk_to_point)
            .state(N::SpinToFinalHeading, states::spin_to_final_heading)
            .state(N::OrthoWalkToPoint, states::ortho_walk_to_point)
            .state(N::OrthoForward, states::ortho_sector)
            .state(N::OrthoBackward, states::ortho_sector)
            .state(N::OrthoLeftStrafe, states::ortho_sector)
            .state(N::OrthoRightStrafe, states::ortho_sector)
            .state(N::OmniWalkToPoint, states::omni_walk_to_point)
            .state(N::Walking, states::walking)
            .state(N::Stepping, states::stepping)
            .state(N::Stop, states::stop)
            .state(N::Stopped, states::stopped)
            .build(N::Stopped)?;

        Ok(Self {
            machine,
            walker: Walker::default(),
        })
    }

    /// Runs the navigator for one frame.
    pub fn run(&mut self, now: Duration, context: &NavContext<'_>) {
        self.machine.run(now, |handler, frame| {
            handler(&mut self.walker, frame, context)
        });
    }

    /// Spins towards `target`, walks to it and spins to its heading.
    pub fn go_to(&mut self, target: Target) {
        self.pursue(target, MovementMode::SpinWalkSpin);
    }

    /// Walks to `target` while turning to its heading.
    pub fn omni_go_to(&mut self, target: Target) {
        self.pursue(target, MovementMode::Omni);
    }

    /// Walks to `target` along one of the four directions of the robot, keeping the current
    /// heading if the target has none.
    pub fn ortho_go_to(&mut self, target: Target, pose: &RobotPose) {
        let target = Target {
            rotation: target.rotation.or(Some(pose.world_rotation())),
            ..target
        };
        self.pursue(target, MovementMode::Orthogonal);
    }

    fn pursue(&mut self, target: Target, mode: MovementMode) {
        let goal = NavigationGoal { target, mode };
        if self.walker.goal == Some(goal) {
            return;
        }

        self.walker.goal = Some(goal);
        if !mode.pursues_in(self.machine.current()) {
            self.machine.switch_to(mode.entry());
        }
    }

    /// Walks with the given velocity until told otherwise.
    ///
    /// Requests that differ from the current walk by less than the epsilons of `config` on
    /// every axis are dropped.
    pub fn set_speed(&mut self, forward: f32, left: f32, turn: f32, config: &NavigatorConfig) {
        let request = WalkCommand::new(forward, left, turn);
        let current = self.walker.walk;
        let unchanged = (request.forward - current.forward).abs() < config.forward_epsilon
            && (request.left - current.left).abs() < config.strafe_epsilon
            && (request.turn - current.turn).abs() < config.spin_epsilon;

        if unchanged && (self.machine.is(NavState::Walking) || self.machine.is(NavState::Stopped))
        {
            return;
        }

        self.walker.goal = None;
        self.walker.requested = request;
        self.machine.switch_to(NavState::Walking);
    }

    /// Takes `count` steps of the given size.
    pub fn set_steps(&mut self, forward: f32, left: f32, turn: f32, count: u32) {
        self.walker.goal = None;
        self.walker.steps = StepCommand {
            forward,
            left,
            turn,
            count,
        };
        self.machine.switch_to(NavState::Stepping);
    }

    /// Stops walking.
    pub fn stop(&mut self) {
        self.walker.goal = None;
        if !matches!(self.machine.current(), NavState::Stop | NavState::Stopped) {
            self.machine.switch_to(NavState::Stop);
        }
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.machine.is(NavState::Stopped)
    }

    /// Whether the robot is within the distance tolerance of the current destination.
    #[must_use]
    pub fn at_destination(&self, context: &NavContext<'_>) -> bool {
        self.walker
            .goal
            .is_some_and(|goal| context.at_destination(&goal.target.position))
    }

    /// Whether the robot is at `heading`, or at the heading of the destination if `None`.
    ///
    /// True if there is no heading to be at.
    #[must_use]
    pub fn at_heading(&self, heading: Option<f32>, context: &NavContext<'_>) -> bool {
        self.heading(heading)
            .is_none_or(|heading| context.at_heading(heading))
    }

    /// Whether the robot is clearly off `heading`, or the heading of the destination if `None`.
    #[must_use]
    pub fn not_at_heading(&self, heading: Option<f32>, context: &NavContext<'_>) -> bool {
        self.heading(heading)
            .is_some_and(|heading| context.not_at_heading(heading))
    }

    fn heading(&self, heading: Option<f32>) -> Option<f32> {
        heading.or_else(|| self.walker.goal.and_then(|goal| goal.target.rotation))
    }

    #[must_use]
    pub fn current_destination(&self) -> Option<Target> {
        self.walker.goal.map(|goal| goal.target)
    }

    #[must_use]
    pub fn movement_mode(&self) -> Option<MovementMode> {
        self.walker.goal.map(|goal| goal.mode)
    }

    #[must_use]
    pub fn state(&self) -> NavState {
        self.machine.current()
    }

    /// The walk velocity last sent to the walking engine.
    #[must_use]
    pub fn walk_vector(&self) -> WalkCommand {
        self.walker.walk
    }

    /// Takes the command issued this frame, if any.
    pub fn take_command(&mut self) -> Option<MotionCommand> {
        self.walker.command.take()
    }
}
