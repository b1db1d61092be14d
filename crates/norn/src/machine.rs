use std::{collections::HashMap, time::Duration};

use colored::{Color, Colorize};
use tracing::{info, trace, warn};

use crate::{Error, Result, State, Transition};

/// Snapshot of the bookkeeping of a [`StateMachine`], handed to a state handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<S> {
    /// The state whose handler is being executed.
    pub state: S,
    /// Whether this is the first frame since the state was entered.
    pub first_frame: bool,
    /// Number of completed frames since the state was entered.
    pub counter: u32,
    /// Time since the state was entered.
    pub state_time: Duration,
    /// The state that ran at the end of the previous frame.
    pub last_state: S,
    /// The most recent state that differs from the current one.
    pub last_diff_state: S,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending<S> {
    None,
    Now(S),
    Later(S),
}

/// A finite state machine whose states are the variants of `S`, each handled by an `H`.
///
/// `H` is usually a function pointer type such as
/// `fn(&mut Agent, &Frame<S>, &mut Context<'_>) -> Transition<S>`. The machine never calls the
/// handlers itself, it hands them to the dispatch closure of [`StateMachine::run`] so the owner
/// decides what data they receive.
#[derive(Debug, Clone)]
pub struct StateMachine<S: State, H: Copy> {
    name: &'static str,
    color: Color,
    log_changes: bool,
    handlers: HashMap<S, H>,
    current: S,
    last: S,
    last_diff: S,
    counter: u32,
    first_frame: bool,
    now: Duration,
    entered_at: Duration,
    pending: Pending<S>,
}

impl<S: State, H: Copy> StateMachine<S, H> {
    /// Starts building a machine with the given name, used in log messages.
    #[must_use]
    pub fn builder(name: &'static str) -> Builder<S, H> {
        Builder {
            name,
            color: Color::White,
            log_changes: true,
            handlers: Vec::new(),
        }
    }

    /// Runs a single frame of the machine.
    ///
    /// A transition requested with [`Transition::SwitchDeferred`] during the previous frame is
    /// resolved first. The handler of the current state is then handed to `dispatch`, and
    /// [`Transition::SwitchNow`] results are followed within this frame.
    pub fn run(&mut self, now: Duration, mut dispatch: impl FnMut(H, &Frame<S>) -> Transition<S>) {
        self.now = now;

        if let Pending::Later(next) = self.pending {
            self.pending = Pending::None;
            self.enter(next);
        }

        // a cascade can visit every state once, anything longer is a loop
        let mut remaining = self.handlers.len();
        loop {
            if let Pending::Now(next) = self.pending {
                self.pending = Pending::None;
                self.enter(next);
            }

            let Some(&handler) = self.handlers.get(&self.current) else {
                unreachable!("every state is registered when the machine is built");
            };

            let frame = self.frame();
            match dispatch(handler, &frame) {
                Transition::Stay => break,
                Transition::SwitchDeferred(next) => {
                    self.pending = Pending::Later(next);
                    break;
                }
                Transition::SwitchNow(_) if remaining == 0 => {
                    warn!(
                        "{}: cut off transition cascade in {:?}",
                        self.name, self.current
                    );
                    break;
                }
                Transition::SwitchNow(next) => {
                    self.pending = Pending::Now(next);
                    remaining -= 1;
                }
            }
        }

        self.counter += 1;
        self.first_frame = false;
        self.last = self.current;
    }

    /// Switches to `state` immediately.
    ///
    /// Switching to the current state re-enters it: the counter and the first frame flag are
    /// reset, but the last different state is kept.
    pub fn switch_to(&mut self, state: S) {
        self.pending = Pending::None;
        self.enter(state);
    }

    /// Switches to `state` if the machine is not already in it.
    pub fn ensure(&mut self, state: S) {
        if self.current != state {
            self.switch_to(state);
        }
    }

    fn enter(&mut self, state: S) {
        if state != self.current {
            self.log_change(self.current, state);
            self.last_diff = self.current;
        }

        self.current = state;
        self.counter = 0;
        self.first_frame = true;
        self.entered_at = self.now;
    }

    fn log_change(&self, from: S, to: S) {
        let tag = self.name.color(self.color).bold();
        if self.log_changes {
            info!("{tag}: {from:?} -> {to:?}");
        } else {
            trace!("{tag}: {from:?} -> {to:?}");
        }
    }

    fn frame(&self) -> Frame<S> {
        Frame {
            state: self.current,
            first_frame: self.first_frame,
            counter: self.counter,
            state_time: self.state_time(),
            last_state: self.last,
            last_diff_state: self.last_diff,
        }
    }

    /// The currently active state.
    #[must_use]
    pub fn current(&self) -> S {
        self.current
    }

    /// Whether the machine is currently in `state`.
    #[must_use]
    pub fn is(&self, state: S) -> bool {
        self.current == state
    }

    /// The state that ran at the end of the previous frame.
    #[must_use]
    pub fn last(&self) -> S {
        self.last
    }

    /// The most recent state that differs from the current one.
    #[must_use]
    pub fn last_diff(&self) -> S {
        self.last_diff
    }

    /// Number of completed frames since the current state was entered.
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Whether the current state has been entered but not yet run.
    #[must_use]
    pub fn first_frame(&self) -> bool {
        self.first_frame
    }

    /// Time since the current state was entered, as of the last call to [`StateMachine::run`].
    #[must_use]
    pub fn state_time(&self) -> Duration {
        self.now.saturating_sub(self.entered_at)
    }

    /// The state a deferred transition will switch to at the start of the next frame.
    #[must_use]
    pub fn pending(&self) -> Option<S> {
        match self.pending {
            Pending::Later(state) => Some(state),
            Pending::Now(_) | Pending::None => None,
        }
    }
}

/// Builder for a [`StateMachine`], see [`StateMachine::builder`].
#[derive(Debug, Clone)]
pub struct Builder<S, H> {
    name: &'static str,
    color: Color,
    log_changes: bool,
    handlers: Vec<(S, H)>,
}

impl<S: State, H: Copy> Builder<S, H> {
    /// Color of the machine name in log messages.
    #[must_use]
    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Whether state changes are logged at `info` level rather than `trace` level.
    #[must_use]
    pub fn log_changes(mut self, log_changes: bool) -> Self {
        self.log_changes = log_changes;
        self
    }

    /// Registers the handler for `state`.
    #[must_use]
    pub fn state(mut self, state: S, handler: H) -> Self {
        self.handlers.push((state, handler));
        self
    }

    /// Builds the machine, starting in `initial`.
    ///
    /// Fails if any variant of `S` has no handler, or has more than one.
    pub fn build(self, initial: S) -> Result<StateMachine<S, H>> {
        let mut handlers = HashMap::with_capacity(self.handlers.len());
        for (state, handler) in self.handlers {
            if handlers.insert(state, handler).is_some() {
                return Err(Error::DuplicateHandler {
                    machine: self.name,
                    state: format!("{state:?}"),
                });
            }
        }

        if let Some(state) = S::iter().find(|state| !handlers.contains_key(state)) {
            return Err(Error::MissingHandler {
                machine: self.name,
                state: format!("{state:?}"),
            });
        }

        Ok(StateMachine {
            name: self.name,
            color: self.color,
            log_changes: self.log_changes,
            handlers,
            current: initial,
            last: initial,
            last_diff: initial,
            counter: 0,
            first_frame: true,
            now: Duration::ZERO,
            entered_at: Duration::ZERO,
            pending: Pending::None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::EnumIter;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
    enum Door {
        Closed,
        Opening,
        Open,
    }

    #[derive(Default)]
    struct Log {
        visits: Vec<(Door, bool, u32)>,
        next: Option<Transition<Door>>,
    }

    type Handler = fn(&mut Log, &Frame<Door>) -> Transition<Door>;

    fn record(log: &mut Log, frame: &Frame<Door>) -> Transition<Door> {
        log.visits.push((frame.state, frame.first_frame, frame.counter));
        log.next.take().unwrap_or(Transition::Stay)
    }

    fn opening(log: &mut Log, frame: &Frame<Door>) -> Transition<Door> {
        log.visits.push((frame.state, frame.first_frame, frame.counter));
        Transition::SwitchNow(Door::Open)
    }

    fn door() -> StateMachine<Door, Handler> {
        StateMachine::<Door, Handler>::builder("door")
            .state(Door::Closed, record)
            .state(Door::Opening, opening)
            .state(Door::Open, record)
            .build(Door::Closed)
            .unwrap()
    }

    fn tick(machine: &mut StateMachine<Door, Handler>, log: &mut Log, millis: u64) {
        machine.run(Duration::from_millis(millis), |handler, frame| {
            handler(log, frame)
        });
    }

    #[test]
    fn missing_handler_is_rejected() {
        let result = StateMachine::<Door, Handler>::builder("door")
            .state(Door::Closed, record)
            .state(Door::Open, record)
            .build(Door::Closed);

        assert_eq!(
            result.unwrap_err(),
            Error::MissingHandler {
                machine: "door",
                state: "Opening".to_string()
            }
        );
    }

    #[test]
    fn duplicate_handler_is_rejected() {
        let result = StateMachine::<Door, Handler>::builder("door")
            .state(Door::Closed, record)
            .state(Door::Opening, opening)
            .state(Door::Open, record)
            .state(Door::Open, record)
            .build(Door::Closed);

        assert!(matches!(result, Err(Error::DuplicateHandler { .. })));
    }

    #[test]
    fn stay_increments_counter() {
        let mut machine = door();
        let mut log = Log::default();

        tick(&mut machine, &mut log, 0);
        tick(&mut machine, &mut log, 10);
        tick(&mut machine, &mut log, 20);

        assert_eq!(
            log.visits,
            vec![
                (Door::Closed, true, 0),
                (Door::Closed, false, 1),
                (Door::Closed, false, 2)
            ]
        );
        assert_eq!(machine.counter(), 3);
    }

    #[test]
    fn switch_now_cascades_within_frame() {
        let mut machine = door();
        let mut log = Log {
            next: Some(Transition::SwitchNow(Door::Opening)),
            ..Default::default()
        };

        tick(&mut machine, &mut log, 0);

        assert_eq!(
            log.visits,
            vec![
                (Door::Closed, true, 0),
                (Door::Opening, true, 0),
                (Door::Open, true, 0)
            ]
        );
        assert_eq!(machine.current(), Door::Open);
        assert_eq!(machine.last_diff(), Door::Opening);
    }

    #[test]
    fn switch_deferred_finishes_frame_first() {
        let mut machine = door();
        let mut log = Log {
            next: Some(Transition::SwitchDeferred(Door::Open)),
            ..Default::default()
        };

        tick(&mut machine, &mut log, 0);
        assert_eq!(machine.current(), Door::Closed);
        assert_eq!(machine.pending(), Some(Door::Open));

        tick(&mut machine, &mut log, 10);
        assert_eq!(machine.current(), Door::Open);
        assert_eq!(log.visits.last(), Some(&(Door::Open, true, 0)));
        assert_eq!(machine.last_state_entered_at_ms(), 10);
    }

    #[test]
    fn reentry_keeps_last_diff() {
        let mut machine = door();
        let mut log = Log::default();

        machine.switch_to(Door::Open);
        tick(&mut machine, &mut log, 0);
        tick(&mut machine, &mut log, 10);
        assert_eq!(machine.last_diff(), Door::Closed);

        machine.switch_to(Door::Open);
        assert!(machine.first_frame());
        assert_eq!(machine.counter(), 0);
        assert_eq!(machine.last_diff(), Door::Closed);

        machine.ensure(Door::Open);
        tick(&mut machine, &mut log, 20);
        machine.ensure(Door::Open);
        assert!(!machine.first_frame());
        assert_eq!(machine.counter(), 1);
    }

    #[test]
    fn state_time_counts_from_entry() {
        let mut machine = door();
        let mut log = Log::default();

        tick(&mut machine, &mut log, 100);
        log.next = Some(Transition::SwitchDeferred(Door::Open));
        tick(&mut machine, &mut log, 200);
        tick(&mut machine, &mut log, 300);
        tick(&mut machine, &mut log, 450);

        assert_eq!(machine.current(), Door::Open);
        assert_eq!(machine.state_time(), Duration::from_millis(150));
    }

    #[test]
    fn endless_cascade_is_cut_off() {
        fn revolve(log: &mut Log, frame: &Frame<Door>) -> Transition<Door> {
            log.visits.push((frame.state, frame.first_frame, frame.counter));
            Transition::SwitchNow(match frame.state {
                Door::Closed => Door::Opening,
                Door::Opening => Door::Open,
                Door::Open => Door::Closed,
            })
        }

        let mut machine = StateMachine::<Door, Handler>::builder("revolving door")
            .state(Door::Closed, revolve)
            .state(Door::Opening, revolve)
            .state(Door::Open, revolve)
            .build(Door::Closed)
            .unwrap();
        let mut log = Log::default();

        tick(&mut machine, &mut log, 0);

        assert_eq!(log.visits.len(), 4);
        assert_eq!(machine.current(), Door::Closed);
        assert_eq!(machine.pending(), None);
    }

    impl<S: State, H: Copy> StateMachine<S, H> {
        fn last_state_entered_at_ms(&self) -> u128 {
            self.entered_at.as_millis()
        }
    }
}
