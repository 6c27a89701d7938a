//! SMTP dispatcher using Lettre.

use chrono_tz::Tz;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use super::template::{render_event, wrap_html};
use super::{DispatchError, NotificationDispatcher};
use crate::model::{BroadcastEvent, Reservation};

/// SMTP connection settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender address, optionally with a display name.
    pub from: String,
    /// Per-connection timeout for the SMTP conversation.
    pub timeout: Duration,
}

/// Dispatcher that mails guests through an SMTP relay.
#[derive(Clone)]
pub struct SmtpDispatcher {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    tz: Tz,
}

impl SmtpDispatcher {
    /// Build the relay transport.
    ///
    /// No connection is opened until the first message is sent.
    pub fn new(config: SmtpConfig, tz: Tz) -> Result<Self, DispatchError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| DispatchError::InvalidAddress(format!("{}: {e}", config.from)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| DispatchError::Transport(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(config.username, config.password))
            .timeout(Some(config.timeout))
            .build();

        Ok(Self { transport, from, tz })
    }

    async fn send(&self, to: &str, subject: &str, html: String) -> Result<(), DispatchError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| DispatchError::InvalidAddress(format!("{to}: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| DispatchError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| DispatchError::Transport(e.to_string()))
    }
}

impl NotificationDispatcher for SmtpDispatcher {
    async fn dispatch(&self, event: &BroadcastEvent) -> Result<(), DispatchError> {
        let reservation = &event.reservation;
        if reservation.email.is_empty() {
            return Err(DispatchError::MissingRecipient(reservation.id.clone()));
        }
        let rendered = render_event(reservation, event.event, self.tz);
        self.send(&rendered.to, &rendered.subject, rendered.html).await?;

        tracing::debug!(
            reservation_id = %reservation.id,
            event = %event.event,
            "Status mail sent"
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
        self.send(&reservation.email, subject, wrap_html(body_html))
            .await
    }
}
