//! Tag store file with a per-worker connection policy

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use sqlx::Connection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::schema::apply_schema;
use crate::worker::WorkerConnection;

/// A tag store file and the policy used to open connections to it.
///
/// ## Architecture
///
/// The store itself holds no connection. Every worker (a filesystem callback
/// thread, a one-shot command, a test task) calls [`connect`](Self::connect)
/// once and owns the returned [`WorkerConnection`] for its whole lifetime.
/// Connections are never shared between workers; SQLite's file locking
/// serializes writers that run on different connections.
///
/// ## State Management
///
/// - **`closed`**: Prevents new connections after [`close`](Self::close)
/// - **`next_worker`**: Monotonic counter used to label connections in logs
/// - **`path`**: Store file path
#[derive(Debug)]
pub struct SqliteStore {
   /// Path to the store file
   path: PathBuf,

   /// Options applied to every connection
   config: StoreConfig,

   /// Marks the store as closed to prevent further connections
   closed: AtomicBool,

   /// Label for the next worker connection
   next_worker: AtomicU64,
}

impl SqliteStore {
   /// Open a store file, creating it and its schema if needed.
   ///
   /// A short-lived bootstrap connection is opened to apply the schema and the
   /// journal mode, so a bad path or a non-SQLite file fails here rather than on
   /// the first worker connection.
   ///
   /// # Arguments
   ///
   /// * `path` - Path to the store file
   /// * `custom_config` - Connection settings, or `None` for [`StoreConfig::default`]
   pub async fn open(
      path: impl AsRef<Path>,
      custom_config: Option<StoreConfig>,
   ) -> Result<Arc<Self>> {
      let path = path.as_ref().to_path_buf();
      let config = custom_config.unwrap_or_default();

      if config.create_if_missing
         && let Some(parent) = path.parent()
         && !parent.as_os_str().is_empty()
         && !parent.exists()
      {
         std::fs::create_dir_all(parent)?;
      }

      let store = Arc::new(Self {
         path,
         config,
         closed: AtomicBool::new(false),
         next_worker: AtomicU64::new(1),
      });

      let bootstrap = store.open_connection().await?;
      bootstrap.close().await?;

      info!(path = %store.path.display(), "Opened tag store");
      Ok(store)
   }

   /// Open a new connection for one worker.
   ///
   /// The schema script is applied before the connection is returned, so the
   /// worker never observes a store without its tables.
   pub async fn connect(&self) -> Result<WorkerConnection> {
      if self.is_closed() {
         return Err(Error::StoreClosed);
      }

      let conn = self.open_connection().await?;
      let worker_id = self.next_worker.fetch_add(1, Ordering::Relaxed);

      debug!(path = %self.path.display(), worker_id, "Opened worker connection");
      Ok(WorkerConnection::new(conn, worker_id))
   }

   /// Stop handing out connections.
   ///
   /// Connections that are already open stay usable until their workers drop
   /// or close them.
   pub fn close(&self) {
      if !self.closed.swap(true, Ordering::SeqCst) {
         debug!(path = %self.path.display(), "Closed tag store");
      }
   }

   /// Returns true once [`close`](Self::close) has been called
   pub fn is_closed(&self) -> bool {
      self.closed.load(Ordering::SeqCst)
   }

   /// Path of the store file
   pub fn path(&self) -> &Path {
      &self.path
   }

   /// Settings applied to each connection
   pub fn config(&self) -> &StoreConfig {
      &self.config
   }

   async fn open_connection(&self) -> Result<SqliteConnection> {
      let options = SqliteConnectOptions::new()
         .filename(&self.path)
         .create_if_missing(self.config.create_if_missing)
         .journal_mode(self.config.journal_mode)
         .busy_timeout(self.config.busy_timeout);

      let mut conn = SqliteConnection::connect_with(&options).await?;
      apply_schema(&mut conn).await?;
      Ok(conn)
   }
}
