//! German mail templates for reservation notifications.

use chrono_tz::Tz;

use crate::model::{EventKind, Reservation};

/// Subject used for free-form messages when the caller gives none.
pub const DEFAULT_MESSAGE_SUBJECT: &str = "Ihre Reservierung bei Yoake";

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; background-color: #f9f9f9; color: #333; }
.container { max-width: 600px; margin: 20px auto; background: #fff; padding: 20px; border-radius: 8px; }
h2 { color: #2c3e50; }
p { line-height: 1.5; }
.footer { margin-top: 20px; font-size: 0.85em; color: #999; }
.status { font-weight: bold; color: #e67e22; }
"#;

/// A rendered mail, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Past participle used in subjects, e.g. "bestätigt".
pub fn event_verb(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Created => "erfasst",
        EventKind::Updated => "aktualisiert",
        EventKind::Confirmed => "bestätigt",
        EventKind::Canceled => "storniert",
        EventKind::Declined => "abgelehnt",
    }
}

fn status_message(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Created => "Ihre Reservierung wurde erfolgreich erfasst.",
        EventKind::Updated => "Ihre Reservierung wurde aktualisiert.",
        EventKind::Confirmed => {
            "Ihre Reservierung wurde bestätigt. Wir freuen uns, Sie begrüßen zu dürfen!"
        }
        EventKind::Canceled => {
            "Leider wurde Ihre Reservierung storniert. Wir entschuldigen uns für die Unannehmlichkeiten."
        }
        EventKind::Declined => "Ihre Reservierung wurde abgelehnt.",
    }
}

/// Render the status mail for a broadcast event.
///
/// The reservation time is shown in the restaurant's zone.
pub fn render_event(reservation: &Reservation, kind: EventKind, tz: Tz) -> RenderedMessage {
    let greeting = match &reservation.first_name {
        Some(first) if !first.is_empty() => format!("{} {}", first, reservation.last_name),
        _ => reservation.last_name.clone(),
    };
    let notes = reservation
        .notes
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or("Keine");
    let when = reservation
        .reserve_at
        .with_timezone(&tz)
        .format("%d.%m.%Y %H:%M");

    let content = format!(
        r#"<h2>Hallo {greeting},</h2>
<p class="status">{message}</p>
<p><strong>Reservierungsdetails:</strong></p>
<ul>
<li>Datum &amp; Uhrzeit: {when}</li>
<li>Anzahl Personen: {amount}</li>
<li>Notizen: {notes}</li>
</ul>
<p>Vielen Dank für Ihre Reservierung!</p>
<div class="footer">Ihr Yoake Restaurant-Team</div>"#,
        greeting = escape_html(&greeting),
        message = status_message(kind),
        amount = reservation.amount,
        notes = escape_html(notes),
    );

    RenderedMessage {
        to: reservation.email.clone(),
        subject: format!("Ihre Reservierung wurde {}", event_verb(kind)),
        html: wrap_html(&content),
    }
}

/// Wrap trusted HTML content in the standard mail layout.
pub fn wrap_html(content: &str) -> String {
    format!(
        r#"<html>
<head>
<meta charset="UTF-8">
<style>{STYLE}</style>
</head>
<body>
<div class="container">
{content}
</div>
</body>
</html>"#
    )
}

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
