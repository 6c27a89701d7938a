//! Validating facade over the writer thread and the reader pool.

use chrono::Utc;

use super::reader::ReaderPool;
use super::writer::WriterHandle;
use crate::error::StoreError;
use crate::model::{NewReservation, Reservation, ReservationFilter, ReservationPatch, ReservationStatus};
use crate::generate_reservation_id;
use crate::validation::validate_new;

/// The only writer of reservation state.
///
/// Every mutation is validated here before it reaches the writer thread, so
/// a rejected request never touches the database. Reads are synchronous and
/// go through the pooled read-only connections.
#[derive(Clone)]
pub struct ReservationStore {
    writer: WriterHandle,
    readers: ReaderPool,
}

impl ReservationStore {
    pub fn new(writer: WriterHandle, readers: ReaderPool) -> Self {
        Self { writer, readers }
    }

    /// The read pool, shared with the availability aggregator.
    pub fn readers(&self) -> &ReaderPool {
        &self.readers
    }

    /// Validate and persist a new reservation with status OPEN.
    ///
    /// An empty id is replaced with a fresh UUIDv7.
    pub async fn create(&self, mut input: NewReservation) -> Result<Reservation, StoreError> {
        if input.id.is_empty() {
            input.id = generate_reservation_id();
        }
        let reservation = validate_new(input, Utc::now())?;
        Ok(self.writer.insert(reservation).await?)
    }

    /// Apply the supplied fields of `patch` to reservation `id`.
    ///
    /// Status goes back to OPEN on every successful update.
    pub async fn update(
        &self,
        id: &str,
        patch: ReservationPatch,
    ) -> Result<Reservation, StoreError> {
        Ok(self.writer.update(id.to_string(), patch).await?)
    }

    /// Set the status of reservation `id` without re-validating its fields.
    pub async fn update_status(
        &self,
        id: &str,
        status: ReservationStatus,
    ) -> Result<Reservation, StoreError> {
        Ok(self.writer.update_status(id.to_string(), status).await?)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Reservation, StoreError> {
        self.readers
            .get_by_id(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn get_all(&self) -> Result<Vec<Reservation>, StoreError> {
        self.get_by_filter(&ReservationFilter::default())
    }

    pub fn get_by_filter(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, StoreError> {
        Ok(self.readers.list(filter)?)
    }
}
