//! In-process event fan-out for session-scoped views.
//!
//! The bus is an explicit observer registry injected into every view that
//! needs it, rather than a process-global event target. Delivery is
//! synchronous and best-effort: handlers run in registration order on the
//! publishing thread, and an event published while nothing is subscribed
//! is simply lost. There is no retry and no persistence; the publishing
//! and receiving views are expected to coexist within one session.

pub mod types;

pub use types::DeskEvent;

use std::sync::Arc;

use parking_lot::Mutex;

type Handler = Arc<dyn Fn(&DeskEvent) + Send + Sync + 'static>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

/// Cloneable handle to a shared subscriber registry. Clones publish to and
/// subscribe on the same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. The returned guard unsubscribes on drop, so the
    /// caller must hold it for as long as it wants deliveries.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&DeskEvent) + Send + Sync + 'static,
    {
        let mut registry = self.inner.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push((id, Arc::new(handler)));

        Subscription {
            inner: Arc::clone(&self.inner),
            id,
        }
    }

    /// Deliver an event to every current subscriber, in registration order.
    ///
    /// The registry lock is released before handlers run, so a handler may
    /// subscribe or publish without deadlocking.
    pub fn publish(&self, event: &DeskEvent) {
        let handlers: Vec<Handler> = {
            let registry = self.inner.lock();
            registry.handlers.iter().map(|(_, h)| Arc::clone(h)).collect()
        };

        for handler in handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().handlers.len()
    }
}

/// RAII guard for a registered handler. Dropping it removes the handler
/// from the registry.
pub struct Subscription {
    inner: Arc<Mutex<Registry>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.inner.lock().handlers.retain(|(id, _)| *id != self.id);
    }
}
