//! Test utilities and in-process harness for Tablecast tests.
//!
//! Provides:
//! - Temporary data directories
//! - A started [`Server`] with a recording or failing dispatcher
//! - Reservation input builders

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use tablecast::config::Config;
use tablecast::model::{BroadcastEvent, EventKind, NewReservation, Reservation};
use tablecast::notify::{DispatchError, NotificationDispatcher};
use tablecast::server::Server;
use tablecast::service::ReservationService;

/// Test fixture that manages a temporary data directory.
///
/// The directory is removed when the fixture is dropped.
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub config: Config,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let config = Config::test_config(temp_dir.path().to_path_buf());
        Self { temp_dir, config }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A sent custom message.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub reservation_id: String,
    pub to: String,
    pub subject: String,
    pub body_html: String,
}

/// Dispatcher that records everything it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    events: Arc<Mutex<Vec<(String, EventKind)>>>,
    messages: Arc<Mutex<Vec<SentMessage>>>,
}

impl RecordingDispatcher {
    pub fn events(&self) -> Vec<(String, EventKind)> {
        self.events.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.messages.lock().unwrap().clone()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    async fn dispatch(&self, event: &BroadcastEvent) -> Result<(), DispatchError> {
        self.events
            .lock()
            .unwrap()
            .push((event.reservation.id.clone(), event.event));
        Ok(())
    }

    async fn send_message(
        &self,
        reservation: &Reservation,
        subject: &str,
        body_html: &str,
    ) -> Result<(), DispatchError> {
        self.messages.lock().unwrap().push(SentMessage {
            reservation_id: reservation.id.clone(),
            to: reservation.email.clone(),
            subject: subject.to_string(),
            body_html: body_html.to_string(),
        });
        Ok(())
    }
}

/// Dispatcher whose every delivery fails.
#[derive(Clone, Default)]
pub struct FailingDispatcher;

impl NotificationDispatcher for FailingDispatcher {
    async fn dispatch(&self, _event: &BroadcastEvent) -> Result<(), DispatchError> {
        Err(DispatchError::Transport("relay unavailable".into()))
    }

    async fn send_message(
        &self,
        _reservation: &Reservation,
        _subject: &str,
        _body_html: &str,
    ) -> Result<(), DispatchError> {
        Err(DispatchError::Transport("relay unavailable".into()))
    }
}

/// A running server over a temporary database.
pub struct TestServer {
    pub server: Server,
    pub service: Arc<ReservationService>,
    pub fixture: TestFixture,
}

impl TestServer {
    pub async fn start<D: NotificationDispatcher>(dispatcher: D) -> Self {
        tablecast::observability::tracing::init_test_tracing();
        let fixture = TestFixture::new();
        let server = Server::start_with(&fixture.config, dispatcher)
            .await
            .expect("failed to start server");
        let service = server.service();
        Self {
            server,
            service,
            fixture,
        }
    }

    /// Shut down and hand back the fixture so the directory outlives the
    /// server.
    pub async fn stop(self) -> TestFixture {
        drop(self.service);
        self.server.shutdown().await.expect("shutdown failed");
        self.fixture
    }
}

/// Valid input for a reservation at `reserve_at`.
pub fn new_reservation(id: &str, reserve_at: DateTime<Utc>, amount: i32) -> NewReservation {
    NewReservation {
        id: id.to_string(),
        first_name: Some("Lena".into()),
        last_name: "Hoffmann".into(),
        amount,
        phone_number: "+49 30 1234567".into(),
        email: "lena.hoffmann@example.de".into(),
        created_at: None,
        reserve_at: Some(reserve_at),
        notes: None,
    }
}

/// Valid input for a reservation one day from now.
pub fn tomorrow(id: &str) -> NewReservation {
    new_reservation(id, Utc::now() + chrono::Duration::days(1), 2)
}

/// Wait for a condition to become true with timeout.
///
/// Returns `true` if the condition was met before `timeout` expired.
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
