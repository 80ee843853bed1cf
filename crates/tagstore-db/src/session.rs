use std::path::Path;
use std::sync::Arc;

use sqlx::sqlite::SqliteConnection;
use tagstore_conn_mgr::{SqliteStore, StoreConfig, WorkerConnection};

use crate::{Files, Options, Result, Selections, Tags};

/// An open tag store.
///
/// Cheap to clone. Each worker asks for its own [`Session`] once at startup
/// and keeps it; sessions are never shared.
#[derive(Debug, Clone)]
pub struct TagStore {
   inner: Arc<SqliteStore>,
}

impl TagStore {
   /// Open or create the store file at `path`.
   pub async fn open(path: impl AsRef<Path>, custom_config: Option<StoreConfig>) -> Result<Self> {
      let inner = SqliteStore::open(path, custom_config).await?;
      Ok(Self { inner })
   }

   /// Open a dedicated connection for one worker.
   pub async fn session(&self) -> Result<Session> {
      let conn = self.inner.connect().await?;
      Ok(Session::new(conn))
   }

   /// Refuse further sessions. Open sessions keep working.
   pub fn close(&self) {
      self.inner.close();
   }

   /// Get the underlying connection manager store.
   pub fn inner(&self) -> &Arc<SqliteStore> {
      &self.inner
   }
}

/// One worker's view of the store.
///
/// The typed accessors borrow the session mutably, so only one handle is
/// active at a time and every call runs to completion on this worker's
/// connection before the next one starts.
#[derive(Debug)]
pub struct Session {
   conn: WorkerConnection,
}

impl Session {
   /// Wrap a connection that was opened by [`SqliteStore::connect`].
   pub fn new(conn: WorkerConnection) -> Self {
      Self { conn }
   }

   /// Tag handle
   pub fn tags(&mut self) -> Tags<'_> {
      Tags::new(&mut self.conn)
   }

   /// File handle
   pub fn files(&mut self) -> Files<'_> {
      Files::new(&mut self.conn)
   }

   /// Mount option handle
   pub fn options(&mut self) -> Options<'_> {
      Options::new(&mut self.conn)
   }

   /// Saved selection handle
   pub fn selections(&mut self) -> Selections<'_> {
      Selections::new(&mut self.conn)
   }

   /// Raw access to this worker's connection, for queries the handles do not cover.
   pub fn connection(&mut self) -> &mut SqliteConnection {
      &mut self.conn
   }

   /// Label of the connection behind this session
   pub fn worker_id(&self) -> u64 {
      self.conn.worker_id()
   }

   /// Close the session's connection gracefully.
   pub async fn close(self) -> Result<()> {
      self.conn.close().await?;
      Ok(())
   }
}
