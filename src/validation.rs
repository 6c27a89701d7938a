//! Reservation field rules.
//!
//! Rules are checked in a fixed order and the first violation wins, so a
//! caller always sees the same message for the same input.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::ValidationError;
use crate::model::{NewReservation, Reservation, ReservationStatus};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-\.]+@([A-Za-z0-9_\-]+\.)+[A-Za-z0-9_\-]{2,}$").expect("valid email regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?\+?[\(\)\- 0-9]{8,20}$").expect("valid phone regex"));

/// Whether `email` looks like a deliverable address.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Whether `phone` looks like an international phone number.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Validate a new reservation and turn it into the record to persist.
///
/// `now` fills in a missing `created_at`. The returned record always has
/// status [`ReservationStatus::Open`].
pub fn validate_new(
    input: NewReservation,
    now: DateTime<Utc>,
) -> Result<Reservation, ValidationError> {
    let created_at = input.created_at.unwrap_or(now);
    let reserve_at = input.reserve_at.ok_or(ValidationError::MissingReserveAt)?;

    if created_at > reserve_at {
        return Err(ValidationError::ReserveAtInPast);
    }
    if input.last_name.is_empty() {
        return Err(ValidationError::MissingLastName);
    }
    if input.phone_number.is_empty() {
        return Err(ValidationError::MissingPhoneNumber);
    }
    if input.email.is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    if !is_valid_email(&input.email) {
        return Err(ValidationError::InvalidEmail);
    }
    if !is_valid_phone(&input.phone_number) {
        return Err(ValidationError::InvalidPhoneNumber);
    }
    if input.amount <= 0 {
        return Err(ValidationError::InvalidAmount);
    }

    Ok(Reservation {
        id: input.id,
        first_name: input.first_name,
        last_name: input.last_name,
        amount: input.amount,
        phone_number: input.phone_number,
        email: input.email,
        created_at,
        reserve_at,
        status: ReservationStatus::Open,
        notes: input.notes,
    })
}
