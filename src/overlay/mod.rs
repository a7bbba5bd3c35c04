//! The overlay state machine: visibility, dismiss policy and reconnection.
//!
//! Everything here is synchronous and single-threaded. Signals, user input
//! and timer expiries are fed in one at a time by the daemon loop; the view
//! and the session client are driven through traits.

pub mod reconnect;

use std::collections::VecDeque;
use std::time::Duration;

use crate::bus::{SignalBus, SubscriberId};
use crate::config::OverlayConfig;
use crate::session::SessionClient;
use crate::signals::{DisconnectedPayload, ShowPayload, Signal};
use crate::timer::{TimerHandle, TimerKind, Timers};

use reconnect::ReconnectCoordinator;
#[cfg(test)]
use reconnect::Backoff;

/// Rendering collaborator. Every method may be called any number of times.
pub trait OverlayView {
    /// False until the view can accept content. Shows are queued until then.
    fn is_ready(&self) -> bool;
    /// Show `content`, or update it in place if already presented.
    fn present(&mut self, content: &OverlayContent);
    /// Start the fade-out that precedes `dismiss`.
    fn fade_out(&mut self) {}
    fn dismiss(&mut self);
}

/// What the view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayContent {
    pub description: String,
    pub icon: Option<String>,
    pub spinner: bool,
    pub loading_icon: Option<String>,
    pub opacity: f32,
}

/// Which user gestures may close the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismissPolicy {
    pub block_on_escape: bool,
    pub block_on_outside_click: bool,
}

impl Default for DismissPolicy {
    fn default() -> Self {
        Self {
            block_on_escape: true,
            block_on_outside_click: false,
        }
    }
}

impl DismissPolicy {
    /// Missing flags fall back to the defaults, never to the previous policy.
    fn from_payload(payload: &ShowPayload) -> Self {
        let defaults = Self::default();
        Self {
            block_on_escape: payload.block_on_escape.unwrap_or(defaults.block_on_escape),
            block_on_outside_click: payload
                .block_on_outside_click
                .unwrap_or(defaults.block_on_outside_click),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    pub visible: bool,
    pub connecting: bool,
    pub disconnected: bool,
    pub content: OverlayContent,
    pub policy: DismissPolicy,
}

impl OverlayState {
    fn new(default_opacity: f32) -> Self {
        Self {
            visible: false,
            connecting: false,
            disconnected: false,
            content: OverlayContent {
                description: String::new(),
                icon: None,
                spinner: false,
                loading_icon: None,
                opacity: default_opacity,
            },
            policy: DismissPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseTrigger {
    Escape,
    OutsideClick,
    Reload,
}

/// Result of a user dismissal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The overlay was not open.
    Ignored,
    /// A probe is in flight.
    Denied,
    /// The dismiss policy forbids this gesture.
    Blocked,
    Closed,
    /// The caller must restart the application.
    Reload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerActivity {
    Move,
    Release,
}

/// Single authority over whether the overlay is shown, what it shows and
/// whether a dismissal request is honoured.
pub struct OverlayController<V, C> {
    state: OverlayState,
    view: V,
    session: C,
    timers: Timers,
    reconnect: ReconnectCoordinator,
    /// Shows that arrived before the view was ready, in arrival order.
    queued: VecDeque<ShowPayload>,
    close_timer: Option<TimerHandle>,
    subscription: Option<SubscriberId>,
    default_opacity: f32,
    close_delay: Duration,
}

impl<V: OverlayView, C: SessionClient> OverlayController<V, C> {
    pub fn new(view: V, session: C, timers: Timers, config: &OverlayConfig) -> Self {
        Self {
            state: OverlayState::new(config.opacity),
            view,
            session,
            timers,
            reconnect: ReconnectCoordinator::new(),
            queued: VecDeque::new(),
            close_timer: None,
            subscription: None,
            default_opacity: config.opacity,
            close_delay: config.close_delay,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    #[cfg(test)]
    pub fn backoff(&self) -> Backoff {
        self.reconnect.backoff()
    }

    #[cfg(test)]
    pub fn is_probing(&self) -> bool {
        self.reconnect.is_probing()
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn subscription(&self) -> Option<SubscriberId> {
        self.subscription
    }

    /// True while any timer is armed; the daemon keeps ticking until then.
    pub fn has_pending_timers(&self) -> bool {
        !self.timers.is_empty()
    }

    // --- Lifecycle ---

    /// Register with the bus. Idempotent.
    pub fn attach(&mut self, bus: &SignalBus) -> SubscriberId {
        if let Some(id) = self.subscription {
            return id;
        }
        let id = bus.subscribe();
        self.subscription = Some(id);
        tracing::info!(
            "overlay: attached ({id:?}, {} subscriber(s))",
            bus.subscriber_count()
        );
        id
    }

    /// Unregister from the bus and tear down: every timer is cancelled and
    /// the state starts over on the next attach.
    pub fn detach(&mut self, bus: &SignalBus) {
        let Some(id) = self.subscription.take() else {
            return;
        };
        bus.unsubscribe(id);

        let cancelled = self.timers.cancel_all();
        self.reconnect = ReconnectCoordinator::new();
        self.close_timer = None;
        self.queued.clear();
        if self.state.visible || cancelled > 0 {
            self.view.dismiss();
        }
        self.state = OverlayState::new(self.default_opacity);
        tracing::info!("overlay: detached ({cancelled} timer(s) cancelled)");
    }

    // --- Signals ---

    /// Bus entry point. Signals are ignored while detached.
    pub fn handle_signal(&mut self, signal: Signal) {
        if !self.is_attached() {
            tracing::debug!("overlay: {} ignored while detached", signal.name());
            return;
        }
        match signal {
            Signal::ShowOverlay(payload) => self.handle_show_signal(payload),
            Signal::DismissOverlay => self.handle_hide_signal(),
            Signal::SignedIn => self.handle_signed_in_signal(),
            Signal::Disconnected(payload) => self.handle_disconnected_signal(payload),
        }
    }

    pub fn handle_show_signal(&mut self, payload: ShowPayload) {
        if !self.view.is_ready() {
            tracing::debug!("overlay: view not ready, show queued");
            self.queued.push_back(payload);
            return;
        }
        self.apply_show(&payload);
    }

    fn apply_show(&mut self, payload: &ShowPayload) {
        let content = &mut self.state.content;
        if let Some(message) = &payload.message {
            content.description.clone_from(message);
        }
        if let Some(opacity) = payload.opacity {
            content.opacity = opacity;
        }
        content.icon.clone_from(&payload.icon);
        content.spinner = payload.spinner;
        content.loading_icon.clone_from(&payload.loading_icon);
        self.state.policy = DismissPolicy::from_payload(payload);
        self.open();
    }

    /// Present the current content and make the overlay visible.
    fn open(&mut self) {
        if let Some(handle) = self.close_timer.take() {
            self.timers.cancel(handle);
            tracing::debug!("overlay: close transition interrupted");
        }
        self.view.present(&self.state.content);
        if !self.state.visible {
            self.state.visible = true;
            tracing::info!("overlay: hidden -> visible");
        }
    }

    fn close(&mut self) {
        if !self.state.visible {
            return;
        }
        self.state.visible = false;
        self.view.fade_out();
        self.close_timer = Some(self.timers.schedule(self.close_delay, TimerKind::CloseTransition));
        tracing::info!("overlay: visible -> hidden");
    }

    /// Privileged close: not subject to the dismiss policy.
    pub fn handle_hide_signal(&mut self) {
        self.reconnect.cancel(&mut self.timers);
        self.state.connecting = false;
        if !self.queued.is_empty() {
            tracing::debug!("overlay: {} queued show(s) dropped by hide", self.queued.len());
            self.queued.clear();
        }
        self.close();
    }

    pub fn handle_signed_in_signal(&mut self) {
        self.handle_hide_signal();
        self.reconnect.reset(&mut self.timers);
        self.state.disconnected = false;
        self.state.content.opacity = self.default_opacity;
        tracing::info!("overlay: signed in");
    }

    pub fn handle_disconnected_signal(&mut self, payload: DisconnectedPayload) {
        self.state.disconnected = true;
        self.state.connecting = false;
        tracing::info!("overlay: disconnected (silent: {})", payload.silent);
        if payload.silent {
            return;
        }
        // Fields the payload leaves out keep the show defaults, so a bare
        // disconnect keeps the description and clears icon and spinner.
        self.handle_show_signal(payload.show);
    }

    /// Apply shows that were queued while the view was initialising.
    pub fn on_view_ready(&mut self) {
        if !self.view.is_ready() {
            return;
        }
        while let Some(payload) = self.queued.pop_front() {
            self.apply_show(&payload);
        }
    }

    // --- User input ---

    pub fn request_close_by_user(&mut self, trigger: CloseTrigger) -> CloseOutcome {
        if !self.state.visible {
            return CloseOutcome::Ignored;
        }
        if trigger == CloseTrigger::Reload {
            tracing::info!("overlay: reload requested");
            return CloseOutcome::Reload;
        }
        if self.state.connecting {
            tracing::debug!("overlay: {trigger:?} denied while connecting");
            return CloseOutcome::Denied;
        }
        let blocked = match trigger {
            CloseTrigger::Escape => self.state.policy.block_on_escape,
            CloseTrigger::OutsideClick => self.state.policy.block_on_outside_click,
            CloseTrigger::Reload => false,
        };
        if blocked {
            tracing::debug!("overlay: {trigger:?} blocked by policy");
            return CloseOutcome::Blocked;
        }
        self.handle_hide_signal();
        CloseOutcome::Closed
    }

    /// Pointer movement or release over the open overlay.
    pub fn on_pointer_activity(&mut self, activity: PointerActivity) -> CloseOutcome {
        if !self.state.visible {
            return CloseOutcome::Ignored;
        }
        if self.reconnect.try_probe(
            self.state.disconnected,
            self.state.connecting,
            &mut self.session,
            &mut self.timers,
        ) {
            self.state.connecting = true;
        }
        match activity {
            PointerActivity::Move => CloseOutcome::Ignored,
            PointerActivity::Release => self.request_close_by_user(CloseTrigger::OutsideClick),
        }
    }

    // --- Timers ---

    /// Dispatch every expired timer. Called from the daemon tick.
    pub fn poll_timers(&mut self) {
        for (handle, kind) in self.timers.take_expired() {
            match kind {
                TimerKind::ReconnectDebounce => {
                    if self.reconnect.on_timer_expired(handle) {
                        // The probe window is over; let the next gesture retry.
                        self.state.connecting = false;
                    }
                }
                TimerKind::CloseTransition => {
                    if self.close_timer == Some(handle) {
                        self.close_timer = None;
                        self.view.dismiss();
                        tracing::debug!("overlay: close transition finished");
                    }
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{RecordingView, ViewCall};
    use super::*;
    use crate::session::testing::RecordingSession;
    use crate::timer::testing::ManualClock;

    struct Harness {
        controller: OverlayController<RecordingView, RecordingSession>,
        view: RecordingView,
        session: RecordingSession,
        clock: ManualClock,
        bus: SignalBus,
    }

    impl Harness {
        fn with_view(view: RecordingView) -> Self {
            let clock = ManualClock::new();
            let session = RecordingSession::default();
            let bus = SignalBus::default();
            let mut controller = OverlayController::new(
                view.clone(),
                session.clone(),
                Timers::new(clock.clone()),
                &OverlayConfig::default(),
            );
            controller.attach(&bus);
            Self {
                controller,
                view,
                session,
                clock,
                bus,
            }
        }

        fn new() -> Self {
            Self::with_view(RecordingView::ready())
        }

        fn advance(&mut self, by: Duration) {
            self.clock.advance(by);
            self.controller.poll_timers();
        }

        fn state(&self) -> &OverlayState {
            self.controller.state()
        }

        fn disconnect(&mut self) {
            self.controller
                .handle_disconnected_signal(DisconnectedPayload::default());
        }
    }

    fn show(json: &str) -> ShowPayload {
        ShowPayload::from_json(json).unwrap()
    }

    // --- show / hide ---

    #[test]
    fn repeated_shows_keep_overlay_open() {
        let mut h = Harness::new();
        h.controller.handle_show_signal(show(r#"{"message":"Connecting"}"#));
        h.controller.handle_show_signal(show(r#"{"spinner":true}"#));
        h.controller.handle_show_signal(show(r#"{"icon":"cloud-off"}"#));

        assert!(h.state().visible);
        assert_eq!(h.view.count(|c| *c == ViewCall::FadeOut), 0);
        assert_eq!(h.view.count(|c| matches!(c, ViewCall::Present(_))), 3);
        assert_eq!(h.state().content.description, "Connecting");
        assert_eq!(h.state().content.icon.as_deref(), Some("cloud-off"));
        assert!(!h.state().content.spinner);
        assert!(!h.controller.has_pending_timers());
    }

    #[test]
    fn second_show_only_changes_present_fields() {
        let mut h = Harness::new();
        h.controller
            .handle_show_signal(show(r#"{"message":"Reconnecting","spinner":true}"#));
        h.controller.handle_show_signal(show(r#"{"icon":"warning"}"#));

        let content = &h.state().content;
        assert_eq!(content.description, "Reconnecting");
        assert_eq!(content.icon.as_deref(), Some("warning"));
        assert!(!content.spinner);
        assert_eq!(h.view.last(), Some(ViewCall::Present(content.clone())));
    }

    #[test]
    fn policy_is_recomputed_per_show() {
        let mut h = Harness::new();
        h.controller.handle_show_signal(show(
            r#"{"blockOnEscape":false,"blockOnOutsideClick":true}"#,
        ));
        assert_eq!(
            h.state().policy,
            DismissPolicy {
                block_on_escape: false,
                block_on_outside_click: true,
            }
        );

        h.controller.handle_show_signal(show("{}"));
        assert_eq!(h.state().policy, DismissPolicy::default());
    }

    #[test]
    fn opacity_sticks_until_signed_in() {
        let mut h = Harness::new();
        h.controller.handle_show_signal(show(r#"{"opacity":0.3}"#));
        h.controller.handle_show_signal(show("{}"));
        assert_eq!(h.state().content.opacity, 0.3);

        h.controller.handle_signed_in_signal();
        assert_eq!(h.state().content.opacity, OverlayConfig::default().opacity);
    }

    #[test]
    fn hide_closes_after_transition() {
        let mut h = Harness::new();
        h.controller.handle_show_signal(ShowPayload::default());
        h.controller.handle_hide_signal();

        assert!(!h.state().visible);
        assert_eq!(h.view.last(), Some(ViewCall::FadeOut));

        h.advance(Duration::from_millis(799));
        assert_eq!(h.view.count(|c| *c == ViewCall::Dismiss), 0);
        h.advance(Duration::from_millis(1));
        assert_eq!(h.view.last(), Some(ViewCall::Dismiss));
        assert!(!h.controller.has_pending_timers());
    }

    #[test]
    fn hide_ignores_dismiss_policy() {
        let mut h = Harness::new();
        h.controller.handle_show_signal(show(
            r#"{"blockOnEscape":true,"blockOnOutsideClick":true}"#,
        ));
        h.disconnect();
        h.controller.on_pointer_activity(PointerActivity::Move);
        assert!(h.state().connecting);

        h.controller.handle_hide_signal();
        assert!(!h.state().visible);
        assert!(!h.state().connecting);
        assert!(!h.controller.is_probing());
    }

    #[test]
    fn hide_while_hidden_is_harmless() {
        let mut h = Harness::new();
        h.controller.handle_hide_signal();
        h.controller.handle_signed_in_signal();
        assert!(!h.state().visible);
        assert!(h.view.calls.borrow().is_empty());
    }

    #[test]
    fn show_during_close_transition_reopens() {
        let mut h = Harness::new();
        h.controller.handle_show_signal(show(r#"{"message":"one"}"#));
        h.controller.handle_hide_signal();
        h.advance(Duration::from_millis(400));
        h.controller.handle_show_signal(show(r#"{"message":"two"}"#));

        h.advance(Duration::from_secs(5));
        assert!(h.state().visible);
        assert_eq!(h.view.count(|c| *c == ViewCall::Dismiss), 0);
        assert_eq!(h.state().content.description, "two");
    }

    // --- disconnected / signed-in ---

    #[test]
    fn disconnected_then_signed_in() {
        let mut h = Harness::new();
        h.disconnect();
        assert!(h.state().visible);
        assert!(h.state().disconnected);

        h.controller.on_pointer_activity(PointerActivity::Move);
        h.advance(Duration::from_secs(1));
        assert_eq!(h.controller.backoff().delay_secs(), 2);

        h.controller.handle_signed_in_signal();
        assert!(!h.state().visible);
        assert!(!h.state().disconnected);
        assert!(!h.state().connecting);
        assert_eq!(h.controller.backoff().delay_secs(), 1);
    }

    #[test]
    fn sign_in_while_probing_restarts_at_initial_delay() {
        let mut h = Harness::new();
        h.disconnect();
        h.controller.on_pointer_activity(PointerActivity::Move);
        h.advance(Duration::from_secs(1));
        h.controller.on_pointer_activity(PointerActivity::Move);
        assert_eq!(h.session.probes(), 2);
        assert!(h.controller.is_probing());

        h.controller.handle_signed_in_signal();
        assert!(!h.controller.is_probing());

        h.disconnect();
        h.controller.on_pointer_activity(PointerActivity::Move);
        assert_eq!(h.session.probes(), 3);
        assert!(h.state().connecting);

        h.advance(Duration::from_millis(999));
        assert!(h.controller.is_probing());
        h.advance(Duration::from_millis(1));
        assert!(!h.controller.is_probing());
        assert!(!h.state().connecting);
        assert_eq!(h.controller.backoff().delay_secs(), 2);
    }

    #[test]
    fn silent_disconnect_does_not_open() {
        let mut h = Harness::new();
        h.controller.handle_disconnected_signal(DisconnectedPayload {
            silent: true,
            show: ShowPayload::default(),
        });
        assert!(h.state().disconnected);
        assert!(!h.state().visible);
        assert!(h.view.calls.borrow().is_empty());
    }

    #[test]
    fn disconnect_reuses_last_content() {
        let mut h = Harness::new();
        h.controller.handle_show_signal(show(
            r#"{"message":"Server lost","icon":"cloud-off","spinner":true,"opacity":0.4}"#,
        ));
        h.controller.handle_hide_signal();
        h.disconnect();

        let content = &h.state().content;
        assert!(h.state().visible);
        assert_eq!(content.description, "Server lost");
        assert_eq!(content.opacity, 0.4);
        assert_eq!(content.icon, None);
        assert!(!content.spinner);
        assert_eq!(h.state().policy, DismissPolicy::default());
    }

    #[test]
    fn disconnect_with_payload_behaves_as_show() {
        let mut h = Harness::new();
        h.controller.handle_disconnected_signal(DisconnectedPayload {
            silent: false,
            show: show(r#"{"message":"Offline","spinner":true}"#),
        });
        assert!(h.state().visible);
        assert_eq!(h.state().content.description, "Offline");
        assert!(h.state().content.spinner);
    }

    #[test]
    fn disconnect_clears_connecting() {
        let mut h = Harness::new();
        h.disconnect();
        h.controller.on_pointer_activity(PointerActivity::Move);
        assert!(h.state().connecting);

        h.disconnect();
        assert!(!h.state().connecting);
        // Still inside the debounce window: no second probe.
        h.controller.on_pointer_activity(PointerActivity::Move);
        assert_eq!(h.session.probes(), 1);
    }

    // --- user dismissal ---

    #[test]
    fn escape_respects_policy() {
        let mut h = Harness::new();
        h.controller.handle_show_signal(ShowPayload::default());
        assert_eq!(
            h.controller.request_close_by_user(CloseTrigger::Escape),
            CloseOutcome::Blocked
        );
        assert!(h.state().visible);

        h.controller
            .handle_show_signal(show(r#"{"blockOnEscape":false}"#));
        assert_eq!(
            h.controller.request_close_by_user(CloseTrigger::Escape),
            CloseOutcome::Closed
        );
        assert!(!h.state().visible);
    }

    #[test]
    fn outside_click_respects_its_own_flag() {
        let mut h = Harness::new();
        h.controller
            .handle_show_signal(show(r#"{"blockOnOutsideClick":true,"blockOnEscape":false}"#));
        assert_eq!(
            h.controller.request_close_by_user(CloseTrigger::OutsideClick),
            CloseOutcome::Blocked
        );

        h.controller.handle_show_signal(ShowPayload::default());
        assert_eq!(
            h.controller.request_close_by_user(CloseTrigger::OutsideClick),
            CloseOutcome::Closed
        );
    }

    #[test]
    fn nothing_but_reload_while_connecting() {
        let mut h = Harness::new();
        h.controller
            .handle_show_signal(show(r#"{"blockOnEscape":false}"#));
        h.disconnect();
        h.controller
            .handle_show_signal(show(r#"{"blockOnEscape":false}"#));
        h.controller.on_pointer_activity(PointerActivity::Move);
        assert!(h.state().connecting);

        for trigger in [CloseTrigger::Escape, CloseTrigger::OutsideClick] {
            assert_eq!(h.controller.request_close_by_user(trigger), CloseOutcome::Denied);
        }
        assert!(h.state().visible);
        assert_eq!(
            h.controller.request_close_by_user(CloseTrigger::Reload),
            CloseOutcome::Reload
        );
    }

    #[test]
    fn requests_ignored_while_hidden() {
        let mut h = Harness::new();
        for trigger in [CloseTrigger::Escape, CloseTrigger::OutsideClick, CloseTrigger::Reload] {
            assert_eq!(h.controller.request_close_by_user(trigger), CloseOutcome::Ignored);
        }
    }

    // --- pointer activity / reconnection ---

    #[test]
    fn pointer_burst_issues_one_probe() {
        let mut h = Harness::new();
        h.disconnect();
        for _ in 0..100 {
            h.controller.on_pointer_activity(PointerActivity::Move);
        }
        assert_eq!(h.session.probes(), 1);
        assert_eq!(h.session.calls.borrow().len(), 2);
    }

    #[test]
    fn retries_after_each_window() {
        let mut h = Harness::new();
        h.disconnect();

        let mut probe_times = Vec::new();
        let mut elapsed = 0u64;
        for _ in 0..40 {
            let before = h.session.probes();
            h.controller.on_pointer_activity(PointerActivity::Move);
            if h.session.probes() > before {
                probe_times.push(elapsed);
            }
            h.advance(Duration::from_secs(1));
            elapsed += 1;
        }
        assert_eq!(probe_times, vec![0, 1, 3, 7, 15, 25, 35]);
    }

    #[test]
    fn pointer_ignored_when_connected_or_hidden() {
        let mut h = Harness::new();
        h.controller.on_pointer_activity(PointerActivity::Move);
        h.controller.handle_show_signal(ShowPayload::default());
        h.controller.on_pointer_activity(PointerActivity::Move);
        assert_eq!(h.session.probes(), 0);

        h.controller.handle_hide_signal();
        h.controller.handle_disconnected_signal(DisconnectedPayload {
            silent: true,
            show: ShowPayload::default(),
        });
        h.controller.on_pointer_activity(PointerActivity::Move);
        assert_eq!(h.session.probes(), 0);
    }

    #[test]
    fn release_probes_before_closing() {
        let mut h = Harness::new();
        h.disconnect();
        assert_eq!(
            h.controller.on_pointer_activity(PointerActivity::Release),
            CloseOutcome::Denied
        );
        assert_eq!(h.session.probes(), 1);
        assert!(h.state().visible);

        h.advance(Duration::from_secs(1));
        h.controller.handle_signed_in_signal();
        h.controller.handle_show_signal(ShowPayload::default());
        assert_eq!(
            h.controller.on_pointer_activity(PointerActivity::Release),
            CloseOutcome::Closed
        );
    }

    // --- view readiness ---

    #[test]
    fn shows_queue_until_view_ready() {
        let view = RecordingView::not_ready();
        let mut h = Harness::with_view(view.clone());
        h.controller.handle_show_signal(show(r#"{"message":"first"}"#));
        h.controller.handle_show_signal(show(r#"{"icon":"warning"}"#));
        assert!(!h.state().visible);
        assert!(view.calls.borrow().is_empty());

        view.ready.set(true);
        h.controller.on_view_ready();
        assert!(h.state().visible);
        assert_eq!(h.state().content.description, "first");
        assert_eq!(h.state().content.icon.as_deref(), Some("warning"));
        assert_eq!(view.count(|c| matches!(c, ViewCall::Present(_))), 2);
    }

    #[test]
    fn hide_after_queued_show_wins() {
        let view = RecordingView::not_ready();
        let mut h = Harness::with_view(view.clone());
        h.controller.handle_show_signal(ShowPayload::default());
        h.controller.handle_hide_signal();

        view.ready.set(true);
        h.controller.on_view_ready();
        assert!(!h.state().visible);
        assert!(view.calls.borrow().is_empty());
    }

    #[test]
    fn disconnect_before_ready_is_queued() {
        let view = RecordingView::not_ready();
        let mut h = Harness::with_view(view.clone());
        h.disconnect();
        assert!(h.state().disconnected);
        assert!(!h.state().visible);

        view.ready.set(true);
        h.controller.on_view_ready();
        assert!(h.state().visible);
    }

    #[test]
    fn queued_disconnect_keeps_earlier_queued_message() {
        let view = RecordingView::not_ready();
        let mut h = Harness::with_view(view.clone());
        h.controller.handle_show_signal(show(r#"{"message":"first","icon":"warning"}"#));
        h.disconnect();

        view.ready.set(true);
        h.controller.on_view_ready();
        assert!(h.state().visible);
        assert!(h.state().disconnected);
        assert_eq!(h.state().content.description, "first");
        assert_eq!(h.state().content.icon, None);
    }

    // --- lifecycle ---

    #[test]
    fn detach_cancels_pending_probe_timer() {
        let mut h = Harness::new();
        h.disconnect();
        h.controller.on_pointer_activity(PointerActivity::Move);
        assert!(h.controller.is_probing());

        h.controller.detach(&h.bus);
        assert!(!h.controller.is_attached());
        assert!(!h.controller.has_pending_timers());

        h.advance(Duration::from_secs(60));
        h.controller.on_pointer_activity(PointerActivity::Move);
        assert_eq!(h.session.probes(), 1);
        assert!(!h.state().visible);
        assert_eq!(h.controller.backoff().delay_secs(), 1);
    }

    #[test]
    fn detach_cancels_close_transition() {
        let mut h = Harness::new();
        h.controller.handle_show_signal(ShowPayload::default());
        h.controller.handle_hide_signal();
        h.controller.detach(&h.bus);
        let dismissals = h.view.count(|c| *c == ViewCall::Dismiss);

        h.advance(Duration::from_secs(5));
        assert_eq!(h.view.count(|c| *c == ViewCall::Dismiss), dismissals);
    }

    #[test]
    fn signals_ignored_after_detach() {
        let mut h = Harness::new();
        h.controller.detach(&h.bus);
        h.controller
            .handle_signal(Signal::ShowOverlay(ShowPayload::default()));
        assert!(!h.state().visible);
        assert_eq!(h.bus.subscriber_count(), 0);
    }

    #[test]
    fn attach_is_idempotent() {
        let mut h = Harness::new();
        let id = h.controller.subscription().unwrap();
        assert_eq!(h.controller.attach(&h.bus), id);
        assert_eq!(h.bus.subscriber_count(), 1);
    }

    #[test]
    fn bus_signals_reach_controller() {
        let mut h = Harness::new();
        let id = h.controller.subscription().unwrap();
        let mut rx = h.bus.take_stream(id).unwrap();

        h.bus.publish(Signal::Disconnected(DisconnectedPayload::default()));
        h.bus.publish(Signal::SignedIn);
        while let Ok(Some(signal)) = rx.try_next() {
            h.controller.handle_signal(signal);
        }
        assert!(!h.state().visible);
        assert!(!h.state().disconnected);
    }
}
