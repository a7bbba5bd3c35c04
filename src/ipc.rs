use std::io::BufRead;
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::channel::mpsc;
use futures::StreamExt;

use crate::app::Message;
use crate::bus::{self, SignalBus, SubscriberId};
use crate::error::Result;
use crate::signals::Signal;

pub(crate) const SOCKET_NAME: &str = "server-overlay.sock";

pub(crate) fn socket_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join(SOCKET_NAME)
}

/// One inbound line, classified.
#[derive(Debug, PartialEq)]
pub(crate) enum Command {
    Signal(Signal),
    Reload,
    Quit,
}

pub(crate) fn parse_command(line: &str) -> Result<Command> {
    match line.trim() {
        "reload" => Ok(Command::Reload),
        "quit" => Ok(Command::Quit),
        other => Signal::parse_line(other).map(Command::Signal),
    }
}

/// Route a line: signals go to the bus, control lines come back as messages.
fn dispatch(line: &str, bus: &SignalBus) -> Option<Message> {
    match parse_command(line) {
        Ok(Command::Signal(signal)) => {
            bus.publish(signal);
            None
        }
        Ok(Command::Reload) => Some(Message::ReloadRequested),
        Ok(Command::Quit) => Some(Message::Quit),
        Err(e) => {
            tracing::warn!("ipc: rejected {:?}: {e}", line.trim());
            None
        }
    }
}

/// Bind the socket, replacing a stale one left by a previous run.
fn bind(path: &Path) -> Result<UnixListener> {
    let _ = std::fs::remove_file(path);
    Ok(UnixListener::bind(path)?)
}

pub(crate) fn socket_listener() -> impl futures::Stream<Item = Message> {
    let (tx, rx) = mpsc::unbounded();
    std::thread::spawn(move || {
        let path = socket_path();
        let listener = match bind(&path) {
            Ok(l) => l,
            Err(e) => {
                tracing::error!("ipc: failed to bind socket {path:?}: {e}");
                return;
            }
        };
        tracing::info!("ipc: listening on {path:?}");
        for stream in listener.incoming().flatten() {
            // A client may send several lines before closing.
            for line in std::io::BufReader::new(stream).lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(msg) = dispatch(&line, bus::global()) {
                    if tx.unbounded_send(msg).is_err() {
                        return;
                    }
                }
            }
        }
    });
    rx
}

/// Signals delivered to one bus subscriber, as daemon messages.
///
/// The subscriber's receiver can be taken once; a second subscription for
/// the same id yields a stream that ends immediately.
pub(crate) fn signal_stream(id: &SubscriberId) -> impl futures::Stream<Item = Message> + use<> {
    let rx = bus::global().take_stream(*id).unwrap_or_else(|| {
        tracing::warn!("ipc: signal stream for {id:?} already taken");
        mpsc::unbounded().1
    });
    rx.map(Message::Signal)
}

pub(crate) fn tick_stream(ms: &u64) -> mpsc::UnboundedReceiver<Message> {
    let ms = *ms;
    let (tx, rx) = mpsc::unbounded();
    std::thread::spawn(move || loop {
        std::thread::sleep(Duration::from_millis(ms));
        if tx.unbounded_send(Message::Tick).is_err() {
            break;
        }
    });
    rx
}
