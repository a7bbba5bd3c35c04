use std::process::{Command, Stdio};

use crate::config::SessionConfig;

/// The server session the overlay probes while disconnected.
///
/// Both calls are fire-and-forget: their outcome comes back later, if at all,
/// as a `signed-in` or `disconnected` signal on the bus.
pub trait SessionClient {
    fn check_if_session_changed(&mut self);
    fn validate_session(&mut self);
}

/// Runs the configured shell commands in the background.
///
/// A command typically ends by calling `server-overlay-ctl signed-in` or
/// `server-overlay-ctl disconnected --silent`.
pub struct CommandSessionClient {
    check: Option<String>,
    validate: Option<String>,
}

impl CommandSessionClient {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            check: config.check.clone(),
            validate: config.validate.clone(),
        }
    }
}

impl SessionClient for CommandSessionClient {
    fn check_if_session_changed(&mut self) {
        match &self.check {
            Some(cmd) => spawn_detached("check", cmd),
            None => tracing::debug!("session: no check command configured"),
        }
    }

    fn validate_session(&mut self) {
        match &self.validate {
            Some(cmd) => spawn_detached("validate", cmd),
            None => tracing::debug!("session: no validate command configured"),
        }
    }
}

/// Spawn `sh -c <command>` and reap it on a background thread.
fn spawn_detached(label: &'static str, command: &str) {
    let child = Command::new("sh")
        .args(["-c", command])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .spawn();

    let mut child = match child {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("session: failed to spawn {label} '{command}': {e}");
            return;
        }
    };

    tracing::info!("session: {label} started (pid {})", child.id());
    std::thread::spawn(move || match child.wait() {
        Ok(status) if status.success() => tracing::debug!("session: {label} finished"),
        Ok(status) => tracing::warn!("session: {label} exited: {status}"),
        Err(e) => tracing::warn!("session: {label} wait failed: {e}"),
    });
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::SessionClient;

    /// Records calls in order. Clones share the log.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingSession {
        pub(crate) calls: Rc<RefCell<Vec<&'static str>>>,
    }

    impl RecordingSession {
        /// Number of complete check + validate pairs issued.
        pub(crate) fn probes(&self) -> usize {
            self.calls.borrow().chunks(2).filter(|c| *c == ["check", "validate"]).count()
        }
    }

    impl SessionClient for RecordingSession {
        fn check_if_session_changed(&mut self) {
            self.calls.borrow_mut().push("check");
        }

        fn validate_session(&mut self) {
            self.calls.borrow_mut().push("validate");
        }
    }
}
