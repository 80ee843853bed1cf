use std::ops::{Deref, DerefMut};

use sqlx::Connection;
use sqlx::sqlite::SqliteConnection;
use tracing::debug;

use crate::Result;

/// A connection owned by exactly one worker.
///
/// Every query needs `&mut` access, so a `WorkerConnection` cannot be used
/// from two places at once. Move it into the worker that uses it; hand a
/// different worker its own connection from [`SqliteStore::connect`].
///
/// [`SqliteStore::connect`]: crate::SqliteStore::connect
#[must_use = "dropping the connection closes it"]
#[derive(Debug)]
pub struct WorkerConnection {
   conn: SqliteConnection,
   worker_id: u64,
}

impl WorkerConnection {
   pub(crate) fn new(conn: SqliteConnection, worker_id: u64) -> Self {
      Self { conn, worker_id }
   }

   /// Label of this connection, unique within its store
   pub fn worker_id(&self) -> u64 {
      self.worker_id
   }

   /// Close the connection gracefully.
   pub async fn close(self) -> Result<()> {
      let worker_id = self.worker_id;
      self.conn.close().await?;
      debug!(worker_id, "Closed worker connection");
      Ok(())
   }
}

impl Deref for WorkerConnection {
   type Target = SqliteConnection;

   fn deref(&self) -> &Self::Target {
      &self.conn
   }
}

impl DerefMut for WorkerConnection {
   fn deref_mut(&mut self) -> &mut Self::Target {
      &mut self.conn
   }
}
