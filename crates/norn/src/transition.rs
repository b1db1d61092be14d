/// The outcome of running the handler of a state for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<S> {
    /// Remain in the current state.
    Stay,
    /// Switch to the given state and run its handler within the same frame.
    SwitchNow(S),
    /// Finish this frame in the current state and switch at the start of the next frame.
    SwitchDeferred(S),
}

impl<S> Transition<S> {
    /// Returns [`Transition::SwitchNow`] if `condition` holds, otherwise [`Transition::Stay`].
    #[must_use]
    pub fn now_if(condition: bool, state: S) -> Self {
        if condition {
            Transition::SwitchNow(state)
        } else {
            Transition::Stay
        }
    }

    /// Returns [`Transition::SwitchDeferred`] if `condition` holds, otherwise [`Transition::Stay`].
    #[must_use]
    pub fn later_if(condition: bool, state: S) -> Self {
        if condition {
            Transition::SwitchDeferred(state)
        } else {
            Transition::Stay
        }
    }
}
