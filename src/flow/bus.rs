//! Fan-out of reservation changes to registered subscribers.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;
use tracing::{debug, trace};

use super::dispatch::DispatchHandle;
use super::subscription::{Slot, Subscription};
use crate::model::BroadcastEvent;
use crate::observability::metrics;

/// Registry of subscriber slots.
///
/// Each subscriber id maps to a single-capacity slot. Broadcasting never
/// waits: an occupied slot is overwritten with the newer event.
pub struct EventBus {
    slots: RwLock<HashMap<String, watch::Sender<Slot>>>,
    dispatch: DispatchHandle,
}

impl EventBus {
    pub fn new(dispatch: DispatchHandle) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            dispatch,
        }
    }

    /// Register `id`, closing any slot it previously held.
    pub fn subscribe(&self, id: impl Into<String>) -> Subscription {
        let id = id.into();
        let (sender, receiver) = watch::channel(None);

        {
            let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
            if slots.insert(id.clone(), sender).is_some() {
                debug!(subscriber = %id, "Replaced existing subscription");
            }
            // Recorded under the lock so concurrent changes keep their order.
            metrics::set_subscribers(slots.len());
        }

        Subscription::new(id, receiver)
    }

    /// Remove and close the slot for `id`. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: &str) {
        let removed = {
            let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
            let removed = slots.remove(id).is_some();
            if removed {
                metrics::set_subscribers(slots.len());
            }
            removed
        };
        if removed {
            debug!(subscriber = %id, "Unsubscribed");
        }
    }

    /// Offer `event` to every slot, then queue one notification job.
    ///
    /// Returns the number of slots the event was placed in.
    pub fn broadcast(&self, event: Arc<BroadcastEvent>) -> usize {
        let mut delivered = 0;
        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            for (id, sender) in slots.iter() {
                if sender.is_closed() {
                    trace!(subscriber = %id, "Skipping slot without receiver");
                    continue;
                }
                sender.send_replace(Some(Arc::clone(&event)));
                delivered += 1;
            }
        }
        metrics::record_broadcast_deliveries(delivered);

        self.dispatch.submit(Arc::clone(&event));

        debug!(
            reservation_id = %event.reservation.id,
            event = %event.event,
            delivered,
            "Broadcast event"
        );
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
