use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::{debug, trace};

use super::{NextChange, SubscriptionError};
use crate::normalize::EncounteredIds;
use crate::store::EntityId;

pub type SubscriptionId = u64;

/// Called after a write with the ids of the records it changed.
pub type ChangeCallback = Arc<dyn Fn(&EncounteredIds) + Send + Sync>;

enum Filter {
    Any,
    Record(EntityId),
}

impl Filter {
    fn matches(&self, changed: &EncounteredIds) -> bool {
        match self {
            Filter::Any => true,
            Filter::Record(id) => changed.contains(id),
        }
    }
}

enum Listener {
    Callback(ChangeCallback),
    Once(oneshot::Sender<()>),
}

struct Subscription {
    filter: Filter,
    listener: Listener,
}

#[derive(Default)]
struct Subscriptions {
    next_id: SubscriptionId,
    // Ordered by id, so callbacks fire in registration order.
    entries: BTreeMap<SubscriptionId, Subscription>,
}

impl Subscriptions {
    // One-shot waiters whose handle was dropped can never be observed.
    fn prune_abandoned(&mut self) {
        self.entries.retain(|_, subscription| match &subscription.listener {
            Listener::Once(sender) => !sender.is_closed(),
            Listener::Callback(_) => true,
        });
    }
}

/// Callbacks to run whenever the store is written to.
///
/// Clones share the same set of subscriptions.
#[derive(Clone, Default)]
pub struct SubscriptionChannel {
    inner: Arc<Mutex<Subscriptions>>,
}

impl SubscriptionChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `callback` after every write.
    pub fn subscribe<F>(&self, callback: F) -> Result<SubscriptionId, SubscriptionError>
    where
        F: Fn(&EncounteredIds) + Send + Sync + 'static,
    {
        self.add(Filter::Any, Listener::Callback(Arc::new(callback)))
    }

    /// Call `callback` after every write that changed the record `id`.
    pub fn subscribe_to_record<F>(
        &self,
        id: EntityId,
        callback: F,
    ) -> Result<SubscriptionId, SubscriptionError>
    where
        F: Fn(&EncounteredIds) + Send + Sync + 'static,
    {
        self.add(Filter::Record(id), Listener::Callback(Arc::new(callback)))
    }

    /// Returns whether the subscription was still registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<bool, SubscriptionError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| SubscriptionError::LockPoisoned("unsubscribe"))?;
        Ok(inner.entries.remove(&id).is_some())
    }

    /// Resolves on the next write of any kind.
    pub fn on_next_change(&self) -> Result<NextChange, SubscriptionError> {
        self.next(Filter::Any)
    }

    /// Resolves on the next write that changes the record `id`.
    pub fn on_next_change_to_record(&self, id: EntityId) -> Result<NextChange, SubscriptionError> {
        self.next(Filter::Record(id))
    }

    /// Announce a completed write. Returns how many listeners were run.
    ///
    /// Listeners run after the channel's lock is released, so they may
    /// subscribe or unsubscribe.
    pub fn notify(&self, changed: &EncounteredIds) -> Result<usize, SubscriptionError> {
        let mut callbacks = Vec::new();
        let mut wakers = Vec::new();
        {
            let mut guard = self
                .inner
                .lock()
                .map_err(|_| SubscriptionError::LockPoisoned("notify"))?;
            let inner = &mut *guard;
            inner.prune_abandoned();
            let fired: Vec<SubscriptionId> = inner
                .entries
                .iter()
                .filter(|(_, subscription)| subscription.filter.matches(changed))
                .map(|(id, _)| *id)
                .collect();
            for id in fired {
                if let Some(Subscription {
                    listener: Listener::Callback(callback),
                    ..
                }) = inner.entries.get(&id)
                {
                    callbacks.push(Arc::clone(callback));
                } else if let Some(Subscription {
                    listener: Listener::Once(sender),
                    ..
                }) = inner.entries.remove(&id)
                {
                    wakers.push(sender);
                }
            }
        }

        let count = callbacks.len() + wakers.len();
        debug!(changed = changed.len(), listeners = count, "subscription.notify");
        for callback in callbacks {
            callback(changed);
        }
        for sender in wakers {
            if sender.send(()).is_err() {
                trace!("subscription.waiter_gone");
            }
        }
        Ok(count)
    }

    /// Number of live subscriptions, one-shot waiters included.
    pub fn len(&self) -> Result<usize, SubscriptionError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| SubscriptionError::LockPoisoned("len"))?;
        inner.prune_abandoned();
        Ok(inner.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, SubscriptionError> {
        Ok(self.len()? == 0)
    }

    fn next(&self, filter: Filter) -> Result<NextChange, SubscriptionError> {
        let (sender, receiver) = oneshot::channel();
        self.add(filter, Listener::Once(sender))?;
        Ok(NextChange::new(receiver))
    }

    fn add(&self, filter: Filter, listener: Listener) -> Result<SubscriptionId, SubscriptionError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| SubscriptionError::LockPoisoned("subscribe"))?;
        inner.prune_abandoned();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.insert(id, Subscription { filter, listener });
        Ok(id)
    }
}
