//! Dedicated writer thread.
//!
//! All mutations go through one thread that owns the only read-write
//! connection. Requests arrive over a bounded channel and are answered on a
//! oneshot, so async callers never block on SQLite and writes are applied
//! strictly one at a time.

use chrono::SubsecRound;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::thread::JoinHandle;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::reader::{row_to_reservation, SELECT_RESERVATION};
use super::schema::{apply_pragmas, initialize_schema};
use super::to_db_time;
use crate::model::{Reservation, ReservationPatch, ReservationStatus};

/// Error type for writer operations.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("writer channel closed")]
    ChannelClosed,

    #[error("reservation not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("failed to spawn writer thread: {0}")]
    Spawn(String),

    #[error("writer thread panicked")]
    ThreadPanic,
}

impl From<rusqlite::Error> for WriterError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

type Reply<T> = oneshot::Sender<Result<T, WriterError>>;

/// Commands processed by the writer thread.
#[derive(Debug)]
enum WriteCommand {
    Insert {
        reservation: Reservation,
        reply: Reply<Reservation>,
    },
    Update {
        id: String,
        patch: ReservationPatch,
        reply: Reply<Reservation>,
    },
    UpdateStatus {
        id: String,
        status: ReservationStatus,
        reply: Reply<Reservation>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Owner of the writer thread.
pub struct Writer {
    handle: WriterHandle,
    thread: JoinHandle<()>,
}

impl Writer {
    /// Open the database, create the schema and start the writer thread.
    ///
    /// The schema exists by the time this returns, so read-only connections
    /// can be opened right after.
    pub fn spawn<P: AsRef<Path>>(db_path: P, channel_size: usize) -> Result<Self, WriterError> {
        let conn = Connection::open(db_path.as_ref())?;
        apply_pragmas(&conn)?;
        initialize_schema(&conn)?;

        let (tx, rx) = mpsc::channel(channel_size.max(1));
        let thread = std::thread::Builder::new()
            .name("tablecast-writer".into())
            .spawn(move || run_writer(conn, rx))
            .map_err(|e| WriterError::Spawn(e.to_string()))?;

        tracing::debug!(path = %db_path.as_ref().display(), "Writer thread started");

        Ok(Self {
            handle: WriterHandle { tx },
            thread,
        })
    }

    /// Get a cloneable handle for submitting writes.
    pub fn handle(&self) -> WriterHandle {
        self.handle.clone()
    }

    /// Wait for the writer thread to exit.
    pub fn join(self) -> Result<(), WriterError> {
        drop(self.handle);
        self.thread.join().map_err(|_| WriterError::ThreadPanic)
    }
}

/// Cloneable handle to the writer thread.
#[derive(Clone, Debug)]
pub struct WriterHandle {
    tx: mpsc::Sender<WriteCommand>,
}

impl WriterHandle {
    /// Insert an already validated reservation.
    pub async fn insert(&self, reservation: Reservation) -> Result<Reservation, WriterError> {
        self.request(|reply| WriteCommand::Insert { reservation, reply })
            .await
    }

    /// Merge `patch` into the stored reservation `id`.
    pub async fn update(
        &self,
        id: String,
        patch: ReservationPatch,
    ) -> Result<Reservation, WriterError> {
        self.request(|reply| WriteCommand::Update { id, patch, reply })
            .await
    }

    /// Overwrite the status of reservation `id`.
    pub async fn update_status(
        &self,
        id: String,
        status: ReservationStatus,
    ) -> Result<Reservation, WriterError> {
        self.request(|reply| WriteCommand::UpdateStatus { id, status, reply })
            .await
    }

    /// Ask the writer thread to stop after the commands already queued.
    pub async fn shutdown(&self) -> Result<(), WriterError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(WriteCommand::Shutdown { reply })
            .await
            .map_err(|_| WriterError::ChannelClosed)?;
        rx.await.map_err(|_| WriterError::ChannelClosed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> WriteCommand,
    ) -> Result<T, WriterError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| WriterError::ChannelClosed)?;
        rx.await.map_err(|_| WriterError::ChannelClosed)?
    }
}

fn run_writer(mut conn: Connection, mut rx: mpsc::Receiver<WriteCommand>) {
    while let Some(command) = rx.blocking_recv() {
        match command {
            WriteCommand::Insert { reservation, reply } => {
                let _ = reply.send(insert(&conn, reservation));
            }
            WriteCommand::Update { id, patch, reply } => {
                let _ = reply.send(update(&mut conn, &id, patch));
            }
            WriteCommand::UpdateStatus { id, status, reply } => {
                let _ = reply.send(update_status(&conn, &id, status));
            }
            WriteCommand::Shutdown { reply } => {
                let _ = reply.send(());
                break;
            }
        }
    }
    tracing::debug!("Writer thread exiting");
}

fn insert(conn: &Connection, mut reservation: Reservation) -> Result<Reservation, WriterError> {
    reservation.created_at = reservation.created_at.trunc_subsecs(6);
    reservation.reserve_at = reservation.reserve_at.trunc_subsecs(6);

    conn.execute(
        "INSERT INTO reservations (id, first_name, last_name, amount, phone_number, email, created_at, reserve_at, status, notes) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            reservation.id,
            reservation.first_name,
            reservation.last_name,
            reservation.amount,
            reservation.phone_number,
            reservation.email,
            to_db_time(&reservation.created_at),
            to_db_time(&reservation.reserve_at),
            reservation.status,
            reservation.notes,
        ],
    )?;
    Ok(reservation)
}

fn update(
    conn: &mut Connection,
    id: &str,
    patch: ReservationPatch,
) -> Result<Reservation, WriterError> {
    let tx = conn.transaction()?;

    let mut reservation = load(&tx, id)?;
    reservation.apply(patch);
    reservation.reserve_at = reservation.reserve_at.trunc_subsecs(6);

    tx.execute(
        "UPDATE reservations SET first_name = ?1, last_name = ?2, amount = ?3, reserve_at = ?4, \
         notes = ?5, status = ?6, phone_number = ?7, email = ?8 WHERE id = ?9",
        params![
            reservation.first_name,
            reservation.last_name,
            reservation.amount,
            to_db_time(&reservation.reserve_at),
            reservation.notes,
            reservation.status,
            reservation.phone_number,
            reservation.email,
            id,
        ],
    )?;
    tx.commit()?;

    Ok(reservation)
}

fn update_status(
    conn: &Connection,
    id: &str,
    status: ReservationStatus,
) -> Result<Reservation, WriterError> {
    let changed = conn.execute(
        "UPDATE reservations SET status = ?1 WHERE id = ?2",
        params![status, id],
    )?;
    if changed == 0 {
        return Err(WriterError::NotFound(id.to_string()));
    }
    load(conn, id)
}

fn load(conn: &Connection, id: &str) -> Result<Reservation, WriterError> {
    conn.query_row(
        &format!("{SELECT_RESERVATION} WHERE id = ?1"),
        [id],
        row_to_reservation,
    )
    .optional()?
    .ok_or_else(|| WriterError::NotFound(id.to_string()))
}
