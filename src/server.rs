//! Process wiring and lifecycle.
//!
//! Starts, in order:
//! - the writer thread (creating the schema)
//! - the reader pool
//! - the notification pool
//! - the event bus, inside [`ReservationService`]

use std::fs;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::flow::DispatchPool;
use crate::notify::{DispatchError, LogDispatcher, NotificationDispatcher, SmtpDispatcher};
use crate::service::ReservationService;
use crate::storage::reader::{ReaderError, ReaderPool};
use crate::storage::writer::{Writer, WriterError};
use crate::storage::ReservationStore;

/// Error type for startup and shutdown.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to create data directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("writer error: {0}")]
    Writer(#[from] WriterError),

    #[error("reader pool error: {0}")]
    Reader(#[from] ReaderError),

    #[error("dispatcher error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// A running Tablecast instance.
pub struct Server {
    service: Arc<ReservationService>,
    writer: Writer,
    dispatch: DispatchPool,
}

impl Server {
    /// Start with the dispatcher selected by `config`.
    ///
    /// Uses SMTP when a relay host is configured and logs mails otherwise.
    pub async fn start(config: &Config) -> Result<Self, ServerError> {
        let tz = config.tz()?;
        match config.smtp_config()? {
            Some(smtp) => {
                tracing::info!(host = %smtp.host, port = smtp.port, "Using SMTP dispatcher");
                Self::start_with(config, SmtpDispatcher::new(smtp, tz)?).await
            }
            None => {
                tracing::info!("No SMTP host configured, notifications are logged only");
                Self::start_with(config, LogDispatcher::new(tz)).await
            }
        }
    }

    /// Start with an explicit dispatcher.
    pub async fn start_with<D: NotificationDispatcher>(
        config: &Config,
        dispatcher: D,
    ) -> Result<Self, ServerError> {
        let tz = config.tz()?;
        fs::create_dir_all(&config.data_dir)?;
        let db_path = config.db_path();

        let writer = Writer::spawn(&db_path, config.write_channel_size)?;
        let readers = ReaderPool::new(&db_path, config.reader_pool_size)?;
        let dispatch = DispatchPool::spawn(dispatcher, config.dispatch_config());

        let store = ReservationStore::new(writer.handle(), readers);
        let service = Arc::new(ReservationService::new(store, tz, dispatch.handle()));

        tracing::info!(
            db = %db_path.display(),
            timezone = %tz,
            "Tablecast started"
        );

        Ok(Self {
            service,
            writer,
            dispatch,
        })
    }

    pub fn service(&self) -> Arc<ReservationService> {
        Arc::clone(&self.service)
    }

    /// Stop the writer thread and drain queued notifications.
    pub async fn shutdown(self) -> Result<(), ServerError> {
        tracing::info!("Shutting down writer thread");
        self.writer.handle().shutdown().await?;
        self.writer.join()?;

        tracing::info!("Draining notification queue");
        self.dispatch.shutdown().await;

        tracing::info!("Tablecast stopped");
        Ok(())
    }
}
