//! Reservation, filter and broadcast event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Party size from which a reservation counts as "large".
pub const BIG_PARTY_SIZE: i32 = 5;

/// Lifecycle status of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Open,
    Confirmed,
    Canceled,
    Declined,
}

impl ReservationStatus {
    /// All statuses, in display order.
    pub const ALL: [Self; 4] = [Self::Open, Self::Confirmed, Self::Canceled, Self::Declined];

    /// The value stored in the `status` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Confirmed => "CONFIRMED",
            Self::Canceled => "CANCELED",
            Self::Declined => "DECLINED",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELED" | "CANCELLED" => Ok(Self::Canceled),
            "DECLINED" => Ok(Self::Declined),
            _ => Err(format!("unknown reservation status: {s}")),
        }
    }
}

/// A persisted reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: String,
    /// Party size.
    pub amount: i32,
    pub phone_number: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub reserve_at: DateTime<Utc>,
    pub status: ReservationStatus,
    pub notes: Option<String>,
}

impl Reservation {
    /// Apply the supplied fields of a patch, leaving the rest untouched.
    ///
    /// Status is reset to [`ReservationStatus::Open`]: any edit sends the
    /// reservation back for review.
    pub fn apply(&mut self, patch: ReservationPatch) {
        if let Some(first_name) = patch.first_name {
            self.first_name = Some(first_name);
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(reserve_at) = patch.reserve_at {
            self.reserve_at = reserve_at;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(phone_number) = patch.phone_number {
            self.phone_number = phone_number;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        self.status = ReservationStatus::Open;
    }
}

/// Input for creating a reservation.
///
/// `created_at` defaults to the current time when absent. `reserve_at` is
/// optional here only so that a missing value can be reported as a
/// validation error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: String,
    pub amount: i32,
    pub phone_number: String,
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
    pub reserve_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Partial update; only `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub amount: Option<i32>,
    pub reserve_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

impl ReservationPatch {
    /// True if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Query filter for listing reservations.
///
/// Text fields match as substrings, ignoring case for ASCII letters only
/// (SQLite `LIKE`), so `müller` does not find `Müller`. `status` matches exactly,
/// `date_from`/`date_to` bound `reserve_at` inclusively and `min_amount`
/// is a lower bound on the party size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationFilter {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub status: Option<ReservationStatus>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub min_amount: Option<i32>,
}

/// What kind of mutation produced a [`BroadcastEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Created,
    Updated,
    Confirmed,
    Canceled,
    Declined,
}

impl EventKind {
    /// Event kind for a status change to `status`.
    ///
    /// Moving a reservation back to OPEN is reported as an update.
    pub fn for_status(status: ReservationStatus) -> Self {
        match status {
            ReservationStatus::Open => Self::Updated,
            ReservationStatus::Confirmed => Self::Confirmed,
            ReservationStatus::Canceled => Self::Canceled,
            ReservationStatus::Declined => Self::Declined,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::Confirmed => "CONFIRMED",
            Self::Canceled => "CANCELED",
            Self::Declined => "DECLINED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of one accepted mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub reservation: Reservation,
    pub event: EventKind,
}

impl BroadcastEvent {
    pub fn new(reservation: Reservation, event: EventKind) -> Self {
        Self { reservation, event }
    }
}
