use std::time::{Duration, Instant};

/// Delay between picking a prompt suggestion and applying it.
pub const SUGGESTION_DELAY: Duration = Duration::from_millis(300);

/// Holds at most one pending value; scheduling again replaces it and restarts the clock.
/// Time is passed in so callers decide what "now" means.
#[derive(Debug)]
pub struct DebouncedTask<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> DebouncedTask<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((now + self.delay, value));
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, value)| value)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Returns the value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.deadline().is_some_and(|deadline| now >= deadline) {
            self.cancel()
        } else {
            None
        }
    }
}
