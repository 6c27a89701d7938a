//! Tablecast: restaurant reservations with live change fan-out.
//!
//! Tablecast validates and persists reservations in SQLite, pushes every
//! accepted mutation to live observers without ever blocking the writer,
//! and aggregates the table into fixed occupancy buckets for the evening
//! service.
//!
//! # Architecture
//!
//! - **Single writer**: all mutations are serialized through one writer thread
//! - **Pooled readers**: queries and statistics use read-only WAL connections
//! - **Lossy fan-out**: each observer has one pending-event slot, newest wins
//! - **Bounded notification**: outbound mail runs on a fixed worker pool
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`error`]: Validation, lookup and storage errors
//! - [`flow`]: Event bus, subscriptions and the dispatch pool
//! - [`model`]: Reservation, filter and event types
//! - [`notify`]: Notification dispatchers (SMTP, log)
//! - [`observability`]: Metrics and tracing setup
//! - [`server`]: Component wiring and lifecycle
//! - [`service`]: Reservation operations exposed to the API layer
//! - [`stats`]: Occupancy aggregation
//! - [`storage`]: SQLite persistence layer
//! - [`validation`]: Reservation field rules

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // storage::reader::ReaderError is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::missing_panics_doc,         // Panic docs can be verbose
    clippy::needless_raw_string_hashes, // r#""# is fine for SQL
    clippy::too_many_lines              // Some functions are inherently long
)]

pub mod config;
pub mod error;
pub mod flow;
pub mod model;
pub mod notify;
pub mod observability;
pub mod server;
pub mod service;
pub mod stats;
pub mod storage;
pub mod validation;

use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable) reservation ID.
///
/// Callers normally supply their own id; this is used when none is given.
///
/// # Example
///
/// ```
/// let id = tablecast::generate_reservation_id();
/// assert!(id.len() == 36); // UUID string format
/// ```
#[must_use]
pub fn generate_reservation_id() -> String {
    Uuid::now_v7().to_string()
}
