use std::time::{Duration, Instant};

/// Cancellation token for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// What a timer is for. Dispatched back to the owner on expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Minimum spacing between two reconnection probes.
    ReconnectDebounce,
    /// Fade-out before the surface is actually dismissed.
    CloseTransition,
}

pub trait Clock {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct PendingTimer {
    handle: TimerHandle,
    kind: TimerKind,
    deadline: Instant,
}

/// Deadline-ordered one-shot timers, polled from the daemon's tick.
///
/// A cancelled handle can never be returned by `take_expired`, which is what
/// lets detach guarantee that nothing fires after teardown.
pub struct Timers {
    clock: Box<dyn Clock>,
    next_id: u64,
    pending: Vec<PendingTimer>,
}

impl Timers {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            next_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn schedule(&mut self, delay: Duration, kind: TimerKind) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.pending.push(PendingTimer {
            handle,
            kind,
            deadline: self.clock.now() + delay,
        });
        handle
    }

    /// Returns false if the handle already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.handle != handle);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    #[cfg(test)]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|t| t.handle == handle)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every timer whose deadline has passed, earliest first.
    pub fn take_expired(&mut self) -> Vec<(TimerHandle, TimerKind)> {
        let now = self.clock.now();
        let mut expired: Vec<PendingTimer> = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].deadline <= now {
                expired.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        expired.sort_by_key(|t| t.deadline);
        expired.into_iter().map(|t| (t.handle, t.kind)).collect()
    }
}
