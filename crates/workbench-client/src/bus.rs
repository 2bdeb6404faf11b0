//! Invalidation bus
//!
//! Named channels that tell any interested view to refetch. Publishing carries
//! no payload; every subscriber of the channel runs its callback once, on its
//! own task, in no particular order.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};

use futures::future::{BoxFuture, FutureExt};
use parking_lot::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Well-known channel names
pub mod channels {
    /// Dataset list and dataset views
    pub const REFETCH_ALL_DATASETS: &str = "refetch_all_datasets";
    /// Whatever component is currently on screen
    pub const REFETCH_COMPONENT: &str = "refetch_component";
}

pub use channels::{REFETCH_ALL_DATASETS, REFETCH_COMPONENT};

/// Callback run on every publish of a subscribed channel
pub type RefetchCallbackFn = dyn Fn() -> BoxFuture<'static, ()> + Send + Sync;

struct Subscriber {
    id: Uuid,
    callback: Arc<RefetchCallbackFn>,
}

#[derive(Default)]
struct BusInner {
    channels: RwLock<HashMap<String, Vec<Subscriber>>>,
}

impl BusInner {
    fn remove(&self, channel: &str, id: Uuid) -> bool {
        let mut channels = self.channels.write();
        let Some(subscribers) = channels.get_mut(channel) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;
        if subscribers.is_empty() {
            channels.remove(channel);
        }
        removed
    }
}

/// Process-wide publish/subscribe hub for refetch notifications
#[derive(Clone, Default)]
pub struct InvalidationBus {
    inner: Arc<BusInner>,
}

impl std::fmt::Debug for InvalidationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let channels = self.inner.channels.read();
        f.debug_struct("InvalidationBus")
            .field("channels", &channels.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl InvalidationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` on `channel`.
    ///
    /// The subscription lasts until the returned handle is dropped or
    /// [`Subscription::unsubscribe`] is called.
    pub fn subscribe<F, Fut>(&self, channel: &str, callback: F) -> Subscription
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let callback: Arc<RefetchCallbackFn> =
            Arc::new(move || -> BoxFuture<'static, ()> { callback().boxed() });

        self.inner
            .channels
            .write()
            .entry(channel.to_string())
            .or_default()
            .push(Subscriber { id, callback });

        debug!(%channel, subscription = %id, "Subscribed");
        Subscription {
            channel: channel.to_string(),
            id,
            bus: Arc::downgrade(&self.inner),
            detached: false,
        }
    }

    /// Notifies every subscriber of `channel` and returns how many were notified.
    ///
    /// Must run inside a tokio runtime; outside one nothing is notified.
    pub fn publish(&self, channel: &str) -> usize {
        let callbacks: Vec<Arc<RefetchCallbackFn>> = {
            let channels = self.inner.channels.read();
            match channels.get(channel) {
                Some(subscribers) => subscribers.iter().map(|s| s.callback.clone()).collect(),
                None => Vec::new(),
            }
        };

        if callbacks.is_empty() {
            debug!(%channel, "Published with no subscribers");
            return 0;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(%channel, "Publish outside a tokio runtime dropped");
                return 0;
            }
        };

        for callback in &callbacks {
            handle.spawn(callback());
        }

        debug!(%channel, notified = callbacks.len(), "Published");
        callbacks.len()
    }

    /// Current subscriber count of `channel`
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.inner
            .channels
            .read()
            .get(channel)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Drops every subscription. Outstanding handles become inert.
    pub fn shutdown(&self) {
        let mut channels = self.inner.channels.write();
        let total: usize = channels.values().map(Vec::len).sum();
        channels.clear();
        debug!(dropped = total, "Invalidation bus shut down");
    }
}

/// Handle to one subscription. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    channel: String,
    id: Uuid,
    bus: Weak<BusInner>,
    detached: bool,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("id", &self.id)
            .finish()
    }
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Removes the subscription now
    pub fn unsubscribe(self) {
        drop(self)
    }

    /// Keeps the subscription alive for the lifetime of the bus
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        if let Some(bus) = self.bus.upgrade() {
            if bus.remove(&self.channel, self.id) {
                debug!(channel = %self.channel, subscription = %self.id, "Unsubscribed");
            }
        }
    }
}
