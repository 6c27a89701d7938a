//! Single-slot subscriber handle.

use std::sync::Arc;

use futures::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

use crate::model::BroadcastEvent;

pub(crate) type Slot = Option<Arc<BroadcastEvent>>;

/// Receiving end of one subscriber's slot.
///
/// The slot holds at most one undelivered event. A broadcast that finds the
/// slot occupied replaces the older event, so a slow reader sees the most
/// recent change since its last drain.
#[derive(Debug)]
pub struct Subscription {
    id: String,
    receiver: watch::Receiver<Slot>,
}

impl Subscription {
    pub(crate) fn new(id: String, receiver: watch::Receiver<Slot>) -> Self {
        Self { id, receiver }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Take the pending event, if any, without waiting.
    ///
    /// An event placed before the slot was closed is still returned once.
    pub fn try_recv(&mut self) -> Option<Arc<BroadcastEvent>> {
        let slot = self.receiver.borrow_and_update();
        if slot.has_changed() {
            slot.clone()
        } else {
            None
        }
    }

    /// Wait for the next event.
    ///
    /// Like [`try_recv`](Self::try_recv), an event placed before the slot was
    /// closed is still returned. After that, `None` once the slot is closed
    /// by `unsubscribe` or by a newer `subscribe` with the same id.
    pub async fn recv(&mut self) -> Option<Arc<BroadcastEvent>> {
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(event) = self.receiver.borrow_and_update().clone() {
                return Some(event);
            }
        }
    }

    /// Whether the slot has been closed.
    pub fn is_closed(&self) -> bool {
        self.receiver.has_changed().is_err()
    }

    /// Turn the subscription into a stream of events.
    pub fn into_stream(self) -> impl Stream<Item = Arc<BroadcastEvent>> + Send {
        WatchStream::from_changes(self.receiver).filter_map(|slot| slot)
    }
}
