//! Store schema.
//!
//! Every statement is guarded with `IF NOT EXISTS`, so the script is safe to
//! run on each new connection. There is no versioning; a store created by an
//! older build simply gains whatever tables or indexes it was missing.

use sqlx::sqlite::SqliteConnection;
use tracing::trace;

use crate::Result;

/// Statements that create the store schema, in execution order.
pub const SCHEMA: &[&str] = &[
   "CREATE TABLE IF NOT EXISTS tags(id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)",
   "CREATE TABLE IF NOT EXISTS tag_files(tag_id INTEGER, file_id INTEGER)",
   "CREATE TABLE IF NOT EXISTS files(id INTEGER PRIMARY KEY, name TEXT, path TEXT)",
   "CREATE TABLE IF NOT EXISTS options(name TEXT UNIQUE, value TEXT)",
   "CREATE TABLE IF NOT EXISTS selections(name TEXT UNIQUE, value TEXT)",
   "CREATE INDEX IF NOT EXISTS tag_files_tag_id ON tag_files(tag_id)",
   "CREATE INDEX IF NOT EXISTS tag_files_file_id ON tag_files(file_id)",
];

/// Applies [`SCHEMA`] to a connection.
pub async fn apply_schema(conn: &mut SqliteConnection) -> Result<()> {
   for statement in SCHEMA {
      sqlx::query(statement).execute(&mut *conn).await?;
   }
   trace!(statements = SCHEMA.len(), "Applied store schema");
   Ok(())
}
