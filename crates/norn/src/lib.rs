//! Frame-driven state machines.
//!
//! Every behavior of the robot (walking to a point, chasing the ball, tracking it with the head,
//! getting up after a fall, picking a team strategy) is a [`StateMachine`] over a closed enum of
//! states. Each state has a single handler that is executed once per frame by
//! [`StateMachine::run`], and returns a [`Transition`] that tells the machine where to go next.
//!
//! The machine only does the bookkeeping: the current and previous states, the number of frames
//! spent in the current state and the time it was entered. The data a behavior works on lives
//! next to the machine in the owning agent, and is handed to the handlers by the agent itself.
//!
//! ```
//! use std::time::Duration;
//!
//! use norn::{Frame, StateMachine, Transition};
//! use strum::EnumIter;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
//! enum Light {
//!     Off,
//!     On,
//! }
//!
//! type Handler = fn(&mut u32, &Frame<Light>) -> Transition<Light>;
//!
//! fn off(_: &mut u32, _: &Frame<Light>) -> Transition<Light> {
//!     Transition::SwitchNow(Light::On)
//! }
//!
//! fn on(toggles: &mut u32, frame: &Frame<Light>) -> Transition<Light> {
//!     if frame.first_frame {
//!         *toggles += 1;
//!     }
//!     Transition::Stay
//! }
//!
//! let mut machine = StateMachine::<Light, Handler>::builder("light")
//!     .state(Light::Off, off)
//!     .state(Light::On, on)
//!     .build(Light::Off)
//!     .unwrap();
//!
//! let mut toggles = 0;
//! machine.run(Duration::ZERO, |handler, frame| handler(&mut toggles, frame));
//!
//! assert_eq!(machine.current(), Light::On);
//! assert_eq!(toggles, 1);
//! ```

mod error;
mod machine;
mod transition;

pub use error::{Error, Result};
pub use machine::{Builder, Frame, StateMachine};
pub use transition::Transition;

use std::{fmt::Debug, hash::Hash};

use strum::IntoEnumIterator;

/// A state tag of a [`StateMachine`].
///
/// This is implemented for every small, copyable enum that can be iterated with
/// [`strum::EnumIter`].
pub trait State: Copy + Eq + Hash + Debug + IntoEnumIterator + Send + Sync + 'static {}

impl<T> State for T where T: Copy + Eq + Hash + Debug + IntoEnumIterator + Send + Sync + 'static {}
