//! Outbound notifications for reservation changes.
//!
//! A [`NotificationDispatcher`] turns a broadcast event into a message for
//! the guest. Dispatchers run on the bounded worker pool in
//! [`crate::flow::dispatch`]; their failures are logged there and never
//! reach the mutation that triggered them.

pub mod log;
pub mod smtp;
pub mod template;

pub use log::LogDispatcher;
pub use smtp::{SmtpConfig, SmtpDispatcher};

use std::future::Future;
use thiserror::Error;

use crate::model::{BroadcastEvent, Reservation};

/// Error type for notification delivery.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("reservation {0} has no email address")]
    MissingRecipient(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("dispatch queue closed")]
    QueueClosed,
}

/// Delivers notifications about reservations.
///
/// This trait abstracts over delivery channels (SMTP, logging, test
/// recorders). Implementations own their timeout policy.
pub trait NotificationDispatcher: Send + Sync + 'static {
    /// Notify the guest about one accepted mutation.
    fn dispatch(
        &self,
        event: &BroadcastEvent,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;

    /// Send a free-form HTML message to the guest of `reservation`.
    fn send_message(
        &self,
        reservation: &Reservation,
        subject: &str,
        body_html: &str,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;
}
