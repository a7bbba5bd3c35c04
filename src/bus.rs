use std::sync::{Mutex, MutexGuard, OnceLock};

use futures::channel::mpsc;

use crate::signals::Signal;

/// Identifies one registration on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct Subscriber {
    id: SubscriberId,
    tx: mpsc::UnboundedSender<Signal>,
    /// Handed out once to whoever drains this subscriber's signals.
    rx: Option<mpsc::UnboundedReceiver<Signal>>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

/// Process-wide broadcast of overlay signals.
///
/// Every published signal is delivered exactly once to every subscriber that
/// is registered at publish time. Unsubscribing closes the subscriber's
/// stream; nothing published afterwards reaches it.
#[derive(Default)]
pub struct SignalBus {
    registry: Mutex<Registry>,
}

static GLOBAL: OnceLock<SignalBus> = OnceLock::new();

/// The bus shared by the socket listener and the daemon.
pub fn global() -> &'static SignalBus {
    GLOBAL.get_or_init(SignalBus::default)
}

impl SignalBus {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Every update is a single push or retain.
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self) -> SubscriberId {
        let mut registry = self.registry();
        registry.next_id += 1;
        let id = SubscriberId(registry.next_id);
        let (tx, rx) = mpsc::unbounded();
        registry.subscribers.push(Subscriber {
            id,
            tx,
            rx: Some(rx),
        });
        tracing::debug!("bus: subscriber {id:?} registered");
        id
    }

    /// Returns false if the id was not registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut registry = self.registry();
        let before = registry.subscribers.len();
        registry.subscribers.retain(|s| s.id != id);
        let removed = registry.subscribers.len() != before;
        if removed {
            tracing::debug!("bus: subscriber {id:?} unregistered");
        }
        removed
    }

    /// Take the receiving end for `id`. Only the first call gets it.
    pub fn take_stream(&self, id: SubscriberId) -> Option<mpsc::UnboundedReceiver<Signal>> {
        self.registry()
            .subscribers
            .iter_mut()
            .find(|s| s.id == id)
            .and_then(|s| s.rx.take())
    }

    /// Deliver `signal` to every subscriber. Returns how many received it.
    pub fn publish(&self, signal: Signal) -> usize {
        let mut registry = self.registry();
        // Subscribers whose stream was dropped are pruned as we go.
        registry
            .subscribers
            .retain(|s| s.rx.is_some() || !s.tx.is_closed());
        let mut delivered = 0;
        for subscriber in &registry.subscribers {
            if subscriber.tx.unbounded_send(signal.clone()).is_ok() {
                delivered += 1;
            }
        }
        tracing::debug!("bus: {} -> {delivered} subscriber(s)", signal.name());
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().subscribers.len()
    }
}
