use sqlx::sqlite::SqliteConnection;
use tracing::debug;

use crate::Result;

/// Mount-time configuration stored as unique key/value pairs.
///
/// Obtained from [`Session::options`](crate::Session::options). Options have
/// no relation to tags or files.
pub struct Options<'c> {
   conn: &'c mut SqliteConnection,
}

impl<'c> Options<'c> {
   pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
      Self { conn }
   }

   /// Set an option, replacing any previous value.
   pub async fn set(&mut self, name: &str, value: &str) -> Result<()> {
      sqlx::query("INSERT OR REPLACE INTO options(name, value) VALUES (?, ?)")
         .bind(name)
         .bind(value)
         .execute(&mut *self.conn)
         .await?;
      debug!(option = name, "Set option");
      Ok(())
   }

   /// Current value of an option.
   pub async fn get(&mut self, name: &str) -> Result<Option<String>> {
      let value =
         sqlx::query_scalar::<_, Option<String>>("SELECT value FROM options WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *self.conn)
            .await?;
      Ok(value.flatten())
   }

   /// Remove an option. Returns whether it was set.
   pub async fn unset(&mut self, name: &str) -> Result<bool> {
      let result = sqlx::query("DELETE FROM options WHERE name = ?")
         .bind(name)
         .execute(&mut *self.conn)
         .await?;
      Ok(result.rows_affected() > 0)
   }

   /// Names of all options that are set.
   pub async fn all_names(&mut self) -> Result<Vec<String>> {
      let names = sqlx::query_scalar::<_, String>("SELECT name FROM options ORDER BY name")
         .fetch_all(&mut *self.conn)
         .await?;
      Ok(names)
   }
}
