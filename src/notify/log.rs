//! Logging dispatcher for development and tests.

use chrono_tz::Tz;
use tracing::info;

use super::template::{render_event, wrap_html};
use super::{DispatchError, NotificationDispatcher};
use crate::model::{BroadcastEvent, Reservation};

/// Dispatcher that logs rendered mails instead of sending them.
///
/// Used when no SMTP host is configured.
#[derive(Clone, Debug)]
pub struct LogDispatcher {
    tz: Tz,
}

impl LogDispatcher {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(&self, event: &BroadcastEvent) -> Result<(), DispatchError> {
        let reservation = &event.reservation;
        if reservation.email.is_empty() {
            return Err(DispatchError::MissingRecipient(reservation.id.clone()));
        }
        let message = render_event(reservation, event.event, self.tz);
        info!(
            to = %message.to,
            subject = %message.subject,
            reservation_id = %reservation.id,
            event = %event.event,
            "Notification (log only)"
        );
        Ok(())
    }

    async fn send_message(
        &self,
        reservation: &Reservation,
        subject: &str,
        body_html: &str,
    ) -> Result<(), DispatchError> {
        if reservation.email.is_empty() {
            return Err(DispatchError::MissingRecipient(reservation.id.clone()));
        }
        let html = wrap_html(body_html);
        info!(
            to = %reservation.email,
            subject = %subject,
            reservation_id = %reservation.id,
            bytes = html.len(),
            "Custom message (log only)"
        );
        Ok(())
    }
}
