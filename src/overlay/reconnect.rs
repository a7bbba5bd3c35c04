use std::time::Duration;

use crate::session::SessionClient;
use crate::timer::{TimerHandle, TimerKind, Timers};

pub const INITIAL_DELAY_SECS: u64 = 1;
pub const MAX_DELAY_SECS: u64 = 10;

/// Exponential spacing between probes: 1, 2, 4, 8, 10, 10, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    delay_secs: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            delay_secs: INITIAL_DELAY_SECS,
        }
    }
}

impl Backoff {
    #[cfg(test)]
    pub fn delay_secs(self) -> u64 {
        self.delay_secs
    }

    pub fn delay(self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    fn advance(&mut self) {
        self.delay_secs = (self.delay_secs * 2).min(MAX_DELAY_SECS);
    }

    fn reset(&mut self) {
        self.delay_secs = INITIAL_DELAY_SECS;
    }
}

/// Debounced reconnection probing.
///
/// Idle while `pending` is `None`, Probing while a debounce timer is armed.
/// The armed timer is the only thing that stops a second probe from starting.
#[derive(Debug, Default)]
pub struct ReconnectCoordinator {
    backoff: Backoff,
    pending: Option<TimerHandle>,
}

impl ReconnectCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_probing(&self) -> bool {
        self.pending.is_some()
    }

    #[cfg(test)]
    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Idle -> Probing. Issues one probe and arms the debounce timer.
    ///
    /// Returns true if a probe was issued; the caller marks itself connecting.
    pub fn try_probe(
        &mut self,
        disconnected: bool,
        connecting: bool,
        session: &mut impl SessionClient,
        timers: &mut Timers,
    ) -> bool {
        if !disconnected || connecting || self.pending.is_some() {
            return false;
        }

        let delay = self.backoff.delay();
        self.pending = Some(timers.schedule(delay, TimerKind::ReconnectDebounce));
        tracing::info!("reconnect: probing session (next probe in >= {delay:?})");

        session.check_if_session_changed();
        session.validate_session();
        true
    }

    /// Probing -> Idle on debounce expiry. Stale handles are ignored.
    pub fn on_timer_expired(&mut self, handle: TimerHandle) -> bool {
        if self.pending != Some(handle) {
            return false;
        }
        self.pending = None;
        self.backoff.advance();
        tracing::debug!("reconnect: window closed, delay -> {}s", self.backoff.delay_secs);
        true
    }

    /// Probing -> Idle without touching the delay (overlay hidden).
    pub fn cancel(&mut self, timers: &mut Timers) {
        if let Some(handle) = self.pending.take() {
            timers.cancel(handle);
            tracing::debug!("reconnect: debounce cancelled");
        }
    }

    /// Probing -> Idle and back to the initial delay (signed in).
    pub fn reset(&mut self, timers: &mut Timers) {
        self.cancel(timers);
        self.backoff.reset();
    }
}
