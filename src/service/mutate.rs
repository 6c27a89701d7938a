//! Mutating operations.

use std::sync::Arc;
use std::time::Instant;

use super::ReservationService;
use crate::error::StoreError;
use crate::model::{
    BroadcastEvent, EventKind, NewReservation, Reservation, ReservationPatch, ReservationStatus,
};
use crate::observability::metrics::record_mutation;

impl ReservationService {
    /// Validate and store a new reservation, then broadcast `CREATED`.
    #[tracing::instrument(skip(self, input), fields(reservation_id = %input.id))]
    pub async fn create_reservation(
        &self,
        input: NewReservation,
    ) -> Result<Reservation, StoreError> {
        let start = Instant::now();
        let reservation = self.store.create(input).await?;
        self.publish(&reservation, EventKind::Created, start);
        Ok(reservation)
    }

    /// Apply `patch` and broadcast `UPDATED`. The status returns to OPEN.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_reservation(
        &self,
        id: &str,
        patch: ReservationPatch,
    ) -> Result<Reservation, StoreError> {
        let start = Instant::now();
        let reservation = self.store.update(id, patch).await?;
        self.publish(&reservation, EventKind::Updated, start);
        Ok(reservation)
    }

    /// Set the status and broadcast the matching event kind.
    #[tracing::instrument(skip(self))]
    pub async fn update_reservation_status(
        &self,
        id: &str,
        status: ReservationStatus,
    ) -> Result<Reservation, StoreError> {
        let start = Instant::now();
        let reservation = self.store.update_status(id, status).await?;
        self.publish(&reservation, EventKind::for_status(status), start);
        Ok(reservation)
    }

    fn publish(&self, reservation: &Reservation, kind: EventKind, start: Instant) {
        record_mutation(kind.as_str(), start.elapsed().as_secs_f64());
        let event = Arc::new(BroadcastEvent::new(reservation.clone(), kind));
        let delivered = self.bus.broadcast(event);
        tracing::info!(
            reservation_id = %reservation.id,
            event = %kind,
            delivered,
            "Reservation changed"
        );
    }
}
