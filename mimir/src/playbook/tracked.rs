use std::time::Duration;

/// A value together with its recent history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tracked<T> {
    current: T,
    previous: T,
    previous_distinct: T,
    frames: u32,
    entered: Duration,
}

impl<T: Copy + PartialEq> Tracked<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            current: initial,
            previous: initial,
            previous_distinct: initial,
            frames: 0,
            entered: Duration::ZERO,
        }
    }

    /// Records the value of this frame, returns whether it changed.
    pub fn update(&mut self, value: T, now: Duration) -> bool {
        self.previous = self.current;

        if value == self.current {
            self.frames += 1;
            return false;
        }

        self.previous_distinct = self.current;
        self.current = value;
        self.frames = 0;
        self.entered = now;
        true
    }

    #[must_use]
    pub fn current(&self) -> T {
        self.current
    }

    /// The value of the previous frame.
    #[must_use]
    pub fn previous(&self) -> T {
        self.previous
    }

    /// The value before the last change.
    #[must_use]
    pub fn previous_distinct(&self) -> T {
        self.previous_distinct
    }

    /// Frames since the last change.
    #[must_use]
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Time since the last change.
    #[must_use]
    pub fn elapsed(&self, now: Duration) -> Duration {
        now.saturating_sub(self.entered)
    }
}

/// Holds back a change of value until the same new value has been proposed for more than a
/// number of consecutive frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnDeck<T> {
    candidate: Option<T>,
    frames: u32,
}

impl<T> Default for OnDeck<T> {
    fn default() -> Self {
        Self {
            candidate: None,
            frames: 0,
        }
    }
}

impl<T: Copy + PartialEq> OnDeck<T> {
    /// Returns the value to commit this frame given the `committed` one and the `proposed` one.
    ///
    /// `proposed` is committed once it has been proposed for more than `buffer` frames in a row,
    /// or immediately if `force` is set.
    pub fn propose(&mut self, committed: T, proposed: T, buffer: u32, force: bool) -> T {
        if force || proposed == committed {
            *self = Self::default();
            return proposed;
        }

        if self.candidate == Some(proposed) {
            self.frames += 1;
        } else {
            self.candidate = Some(proposed);
            self.frames = 1;
        }

        if self.frames > buffer {
            *self = Self::default();
            proposed
        } else {
            committed
        }
    }

    /// The value waiting to be committed, if any.
    #[must_use]
    pub fn candidate(&self) -> Option<T> {
        self.candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracked_records_history() {
        let mut tracked = Tracked::new('a');

        assert!(!tracked.update('a', Duration::from_secs(1)));
        assert_eq!(tracked.frames(), 1);

        assert!(tracked.update('b', Duration::from_secs(2)));
        assert_eq!(tracked.frames(), 0);
        assert_eq!(tracked.previous(), 'a');
        assert_eq!(tracked.previous_distinct(), 'a');

        assert!(!tracked.update('b', Duration::from_secs(3)));
        assert_eq!(tracked.previous(), 'b');
        assert_eq!(tracked.previous_distinct(), 'a');
        assert_eq!(tracked.elapsed(Duration::from_secs(5)), Duration::from_secs(3));
    }

    #[test]
    fn single_frame_blip_is_ignored() {
        let mut deck = OnDeck::default();

        assert_eq!(deck.propose('a', 'b', 10, false), 'a');
        assert_eq!(deck.propose('a', 'a', 10, false), 'a');
        assert_eq!(deck.candidate(), None);
    }

    #[test]
    fn commits_after_buffer_plus_one_frames() {
        let buffer = 10;
        let mut deck = OnDeck::default();

        for _ in 0..buffer {
            assert_eq!(deck.propose('a', 'b', buffer, false), 'a');
        }
        assert_eq!(deck.propose('a', 'b', buffer, false), 'b');
    }

    #[test]
    fn new_candidate_restarts_count() {
        let buffer = 3;
        let mut deck = OnDeck::default();

        for _ in 0..buffer {
            deck.propose('a', 'b', buffer, false);
        }
        assert_eq!(deck.propose('a', 'c', buffer, false), 'a');
        for _ in 0..buffer - 1 {
            assert_eq!(deck.propose('a', 'c', buffer, false), 'a');
        }
        assert_eq!(deck.propose('a', 'c', buffer, false), 'c');
    }

    #[test]
    fn forced_change_commits_immediately() {
        let mut deck = OnDeck::default();

        assert_eq!(deck.propose('a', 'b', 10, true), 'b');
    }
}
