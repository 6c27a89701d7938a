//! Read-only operations.

use chrono::NaiveDate;

use super::{blocking, ReservationService};
use crate::error::StoreError;
use crate::model::{Reservation, ReservationFilter};
use crate::stats::ReservationStats;

impl ReservationService {
    pub async fn get_reservation(&self, id: &str) -> Result<Reservation, StoreError> {
        let store = self.store.clone();
        let id = id.to_string();
        blocking(move || store.get_by_id(&id)).await
    }

    /// List reservations, newest `reserve_at` first.
    pub async fn list_reservations(
        &self,
        filter: Option<ReservationFilter>,
    ) -> Result<Vec<Reservation>, StoreError> {
        let store = self.store.clone();
        blocking(move || match filter {
            Some(filter) => store.get_by_filter(&filter),
            None => store.get_all(),
        })
        .await
    }

    /// Totals for `date` (or the whole table) and today's occupancy buckets
    /// when no date is given.
    pub async fn get_stats(&self, date: Option<NaiveDate>) -> Result<ReservationStats, StoreError> {
        let stats = self.stats.clone();
        blocking(move || stats.stats(date)).await
    }
}
