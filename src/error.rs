//! Error kinds surfaced by the reservation core.
//!
//! Validation reasons are user-facing German sentences so the API layer can
//! show them verbatim.

use thiserror::Error;

use crate::notify::DispatchError;
use crate::storage::reader::ReaderError;
use crate::storage::writer::WriterError;

/// A caller-fixable problem with reservation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Reservierungsdatum darf nicht leer sein.")]
    MissingReserveAt,

    #[error("Du kannst nicht in die Vergangenheit reservieren.")]
    ReserveAtInPast,

    #[error("Nachname ist erforderlich.")]
    MissingLastName,

    #[error("Telefonnummer ist erforderlich.")]
    MissingPhoneNumber,

    #[error("E-Mail-Adresse ist erforderlich.")]
    MissingEmail,

    #[error("Ungültige E-Mail-Adresse.")]
    InvalidEmail,

    #[error("Ungültige Telefonnummer.")]
    InvalidPhoneNumber,

    #[error("Personenanzahl darf nicht kleiner als 1 sein.")]
    InvalidAmount,
}

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Reservierung {0} nicht gefunden.")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    /// True for errors the caller can fix by changing its input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<WriterError> for StoreError {
    fn from(err: WriterError) -> Self {
        match err {
            WriterError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<ReaderError> for StoreError {
    fn from(err: ReaderError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Error type for operations that also talk to the mail dispatcher.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("notification failed: {0}")]
    Dispatch(#[from] DispatchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_are_distinct() {
        let all = [
            ValidationError::MissingReserveAt,
            ValidationError::ReserveAtInPast,
            ValidationError::MissingLastName,
            ValidationError::MissingPhoneNumber,
            ValidationError::MissingEmail,
            ValidationError::InvalidEmail,
            ValidationError::InvalidPhoneNumber,
            ValidationError::InvalidAmount,
        ];
        let mut messages: Vec<String> = all.iter().map(ToString::to_string).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), all.len());
    }

    #[test]
    fn test_writer_not_found_maps_to_not_found() {
        let err: StoreError = WriterError::NotFound("abc".into()).into();
        assert!(matches!(err, StoreError::NotFound(ref id) if id == "abc"));

        let err: StoreError = WriterError::ChannelClosed.into();
        assert!(matches!(err, StoreError::Storage(_)));
        assert!(!err.is_validation());
    }
}
