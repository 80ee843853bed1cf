//! Configuration for tag store connections

use std::time::Duration;

use sqlx::sqlite::SqliteJournalMode;

/// Configuration applied to every connection opened by a `SqliteStore`
///
/// # Examples
///
/// ```
/// use tagstore_conn_mgr::StoreConfig;
/// use std::time::Duration;
///
/// // Use defaults
/// let config = StoreConfig::default();
///
/// // Override just one field
/// let config = StoreConfig {
///     busy_timeout: Duration::from_secs(1),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
   /// How long a connection waits on a lock held by another connection
   /// before the statement fails with `SQLITE_BUSY`
   ///
   /// Writers on different workers are serialized by SQLite's own locking,
   /// so this is effectively the write-contention budget.
   ///
   /// Default: 5 seconds
   pub busy_timeout: Duration,

   /// Create the store file if it does not exist yet
   ///
   /// Default: true
   pub create_if_missing: bool,

   /// Journal mode set on each connection
   ///
   /// WAL lets readers keep working while a single writer commits.
   ///
   /// Default: `SqliteJournalMode::Wal`
   pub journal_mode: SqliteJournalMode,
}

impl Default for StoreConfig {
   fn default() -> Self {
      Self {
         busy_timeout: Duration::from_secs(5),
         create_if_missing: true,
         journal_mode: SqliteJournalMode::Wal,
      }
   }
}
