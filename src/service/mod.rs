//! Request handling for reservations.
//!
//! [`ReservationService`] ties the store, the event bus and the aggregator
//! together. Every accepted mutation is broadcast exactly once, after it has
//! been committed.

mod mutate;
mod query;

use chrono_tz::Tz;

use crate::error::{ServiceError, StoreError};
use crate::flow::{DispatchHandle, DispatchSnapshot, EventBus, Subscription};
use crate::notify::template::DEFAULT_MESSAGE_SUBJECT;
use crate::stats::AvailabilityAggregator;
use crate::storage::ReservationStore;

/// Reservation operations exposed to callers.
pub struct ReservationService {
    store: ReservationStore,
    bus: EventBus,
    stats: AvailabilityAggregator,
    dispatch: DispatchHandle,
}

impl ReservationService {
    pub fn new(store: ReservationStore, tz: Tz, dispatch: DispatchHandle) -> Self {
        let stats = AvailabilityAggregator::new(store.readers().clone(), tz);
        Self {
            bus: EventBus::new(dispatch.clone()),
            store,
            stats,
            dispatch,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.stats.timezone()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Register a subscriber; a previous subscription with the same id is
    /// closed.
    pub fn subscribe(&self, subscriber_id: impl Into<String>) -> Subscription {
        self.bus.subscribe(subscriber_id)
    }

    pub fn unsubscribe(&self, subscriber_id: &str) {
        self.bus.unsubscribe(subscriber_id);
    }

    /// Counters of the notification pool.
    pub fn dispatch_stats(&self) -> DispatchSnapshot {
        self.dispatch.stats().snapshot()
    }

    /// Send a free-form HTML message to the guest of reservation `id`.
    ///
    /// Unlike status mails, the outcome is returned to the caller.
    #[tracing::instrument(skip(self, body_html))]
    pub async fn send_message(
        &self,
        id: &str,
        subject: Option<&str>,
        body_html: &str,
    ) -> Result<(), ServiceError> {
        let reservation = self.get_reservation(id).await?;
        let subject = subject
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_MESSAGE_SUBJECT);

        self.dispatch
            .send_message(reservation, subject.to_string(), body_html.to_string())
            .await?;

        tracing::info!(reservation_id = %id, "Custom message sent");
        Ok(())
    }
}

/// Run a blocking read on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Storage(format!("read task failed: {e}")))?
}
