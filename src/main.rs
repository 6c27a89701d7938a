//! tablecast: administrative command line for the reservation store.
//!
//! # Usage
//!
//! ```bash
//! tablecast --data-dir ./data create --last-name Weber --amount 4 \
//!     --phone "+49 30 1234567" --email weber@example.de --reserve-at "2026-11-02 19:30"
//! tablecast stats --date 2026-11-02
//! ```
//!
//! Environment variables can also be used:
//! - `TABLECAST_DATA_DIR`: Data directory for SQLite
//! - `TABLECAST_TIMEZONE`: Zone for local times and statistics
//! - `SMTP_HOST`, `SMTP_FROM`, ...: Outbound mail relay
//! - `RUST_LOG`: Log filter

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde::Serialize;

use tablecast::config::Config;
use tablecast::model::{NewReservation, ReservationFilter, ReservationPatch, ReservationStatus};
use tablecast::observability::metrics::init_metrics_with_endpoint;
use tablecast::observability::tracing::init_tracing;
use tablecast::server::Server;
use tablecast::service::ReservationService;
use tablecast::stats::local_to_utc;

/// Restaurant reservations with live change fan-out and occupancy statistics.
#[derive(Parser)]
#[command(name = "tablecast")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a reservation
    Create {
        /// Reservation id (defaults to a new UUIDv7)
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long, default_value = "")]
        last_name: String,
        /// Party size
        #[arg(long, default_value_t = 0)]
        amount: i32,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        /// RFC 3339 or local "YYYY-MM-DD HH:MM"
        #[arg(long)]
        reserve_at: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Update fields of a reservation (status returns to OPEN)
    Update {
        id: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        amount: Option<i32>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// RFC 3339 or local "YYYY-MM-DD HH:MM"
        #[arg(long)]
        reserve_at: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Set the status of a reservation
    Status {
        id: String,
        /// OPEN, CONFIRMED, CANCELED or DECLINED
        status: ReservationStatus,
    },
    /// Show one reservation
    Get { id: String },
    /// List reservations, newest first
    List {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        status: Option<ReservationStatus>,
        /// Earliest reservation time, inclusive
        #[arg(long)]
        from: Option<String>,
        /// Latest reservation time, inclusive
        #[arg(long)]
        to: Option<String>,
        /// Minimum party size
        #[arg(long)]
        min_amount: Option<i32>,
    },
    /// Show totals and the evening occupancy buckets
    Stats {
        /// Local date (YYYY-MM-DD); totals cover the whole table when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Send a custom HTML message to the guest of a reservation
    Message {
        id: String,
        #[arg(long)]
        subject: Option<String>,
        /// HTML body (or use --file)
        body: Option<String>,
        /// Read the body from a file
        #[arg(short, long)]
        file: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.config.log_level);
    init_metrics_with_endpoint(cli.config.otel_endpoint.as_deref());

    let server = Server::start(&cli.config)
        .await
        .context("failed to start tablecast")?;
    let service = server.service();
    let tz = service.timezone();

    let outcome = run(&service, tz, cli.command).await;

    // Queued notifications are drained even when the command failed.
    drop(service);
    server.shutdown().await?;
    outcome
}

async fn run(service: &ReservationService, tz: Tz, command: Commands) -> Result<()> {
    match command {
        Commands::Create {
            id,
            first_name,
            last_name,
            amount,
            phone,
            email,
            reserve_at,
            notes,
        } => {
            let input = NewReservation {
                id: id.unwrap_or_default(),
                first_name,
                last_name,
                amount,
                phone_number: phone,
                email,
                created_at: None,
                reserve_at: reserve_at.as_deref().map(|raw| parse_time(raw, tz)).transpose()?,
                notes,
            };
            print_json(&service.create_reservation(input).await?)
        }
        Commands::Update {
            id,
            first_name,
            last_name,
            amount,
            phone,
            email,
            reserve_at,
            notes,
        } => {
            let patch = ReservationPatch {
                first_name,
                last_name,
                amount,
                reserve_at: reserve_at.as_deref().map(|raw| parse_time(raw, tz)).transpose()?,
                notes,
                phone_number: phone,
                email,
            };
            if patch.is_empty() {
                bail!("nothing to update");
            }
            print_json(&service.update_reservation(&id, patch).await?)
        }
        Commands::Status { id, status } => {
            print_json(&service.update_reservation_status(&id, status).await?)
        }
        Commands::Get { id } => print_json(&service.get_reservation(&id).await?),
        Commands::List {
            id,
            first_name,
            last_name,
            email,
            phone,
            status,
            from,
            to,
            min_amount,
        } => {
            let filter = ReservationFilter {
                id,
                first_name,
                last_name,
                email,
                phone_number: phone,
                status,
                date_from: from.as_deref().map(|raw| parse_time(raw, tz)).transpose()?,
                date_to: to.as_deref().map(|raw| parse_time(raw, tz)).transpose()?,
                min_amount,
            };
            print_json(&service.list_reservations(Some(filter)).await?)
        }
        Commands::Stats { date } => print_json(&service.get_stats(date).await?),
        Commands::Message {
            id,
            subject,
            body,
            file,
        } => {
            let body = match (body, file) {
                (Some(body), None) => body,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {path}"))?,
                (Some(_), Some(_)) => bail!("pass either a body or --file, not both"),
                (None, None) => bail!("a message body is required"),
            };
            service
                .send_message(&id, subject.as_deref(), &body)
                .await?;
            print_json(&serde_json::json!({ "sent": true, "id": id }))
        }
    }
}

/// Parse RFC 3339, or a local `YYYY-MM-DD HH:MM` in `tz`.
fn parse_time(raw: &str, tz: Tz) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let local = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .with_context(|| format!("invalid time {raw:?}, expected RFC 3339 or YYYY-MM-DD HH:MM"))?;
    Ok(local_to_utc(tz, local)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
