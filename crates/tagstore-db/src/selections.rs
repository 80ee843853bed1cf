use sqlx::sqlite::SqliteConnection;
use tracing::{debug, trace};

use crate::reference::{ALL_TAG, EntityRef};
use crate::selection::{Bind, SelectionExpr, compile};
use crate::{Result, resolve};

/// Saved, named tag selections.
///
/// Obtained from [`Session::selections`](crate::Session::selections). The
/// stored value is selection text (see [`crate::selection`]); it is validated
/// when saved and returned verbatim by [`resolve`](Self::resolve).
pub struct Selections<'c> {
   conn: &'c mut SqliteConnection,
}

impl<'c> Selections<'c> {
   pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
      Self { conn }
   }

   /// Save a selection.
   ///
   /// Returns `Ok(false)` for the reserved name [`ALL_TAG`]. Malformed text fails
   /// with [`Error::InvalidSelection`](crate::Error::InvalidSelection) and a
   /// taken name with the engine's UNIQUE violation.
   pub async fn create(&mut self, name: &str, value: &str) -> Result<bool> {
      if name == ALL_TAG {
         return Ok(false);
      }
      SelectionExpr::parse(value)?;

      sqlx::query("INSERT INTO selections(name, value) VALUES (?, ?)")
         .bind(name)
         .bind(value)
         .execute(&mut *self.conn)
         .await?;

      debug!(selection = name, "Created selection");
      Ok(true)
   }

   /// Delete a selection. Returns whether it existed.
   pub async fn remove(&mut self, name: &str) -> Result<bool> {
      let result = sqlx::query("DELETE FROM selections WHERE name = ?")
         .bind(name)
         .execute(&mut *self.conn)
         .await?;
      Ok(result.rows_affected() > 0)
   }

   /// Rename a selection. Returns `Ok(false)` if either name is [`ALL_TAG`] or
   /// `src` does not exist.
   pub async fn rename(&mut self, src: &str, dst: &str) -> Result<bool> {
      if src == ALL_TAG || dst == ALL_TAG {
         return Ok(false);
      }

      let result = sqlx::query("UPDATE selections SET name = ? WHERE name = ?")
         .bind(dst)
         .bind(src)
         .execute(&mut *self.conn)
         .await?;
      Ok(result.rows_affected() > 0)
   }

   pub async fn exists(&mut self, name: &str) -> Result<bool> {
      Ok(self.resolve(name).await?.is_some())
   }

   /// Stored text of a selection, exactly as it was saved.
   pub async fn resolve(&mut self, name: &str) -> Result<Option<String>> {
      let value =
         sqlx::query_scalar::<_, Option<String>>("SELECT value FROM selections WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *self.conn)
            .await?;
      Ok(value.flatten())
   }

   /// Parsed expression of a selection.
   pub async fn expression(&mut self, name: &str) -> Result<Option<SelectionExpr>> {
      match self.resolve(name).await? {
         Some(text) => Ok(Some(SelectionExpr::parse(&text)?)),
         None => Ok(None),
      }
   }

   pub async fn all_names(&mut self) -> Result<Vec<String>> {
      let names = sqlx::query_scalar::<_, String>("SELECT name FROM selections ORDER BY rowid")
         .fetch_all(&mut *self.conn)
         .await?;
      Ok(names)
   }

   /// Names of the files matched by a selection, each file once, in
   /// registration order. An unknown selection matches nothing.
   pub async fn select(&mut self, name: &str) -> Result<Vec<String>> {
      let Some(expr) = self.expression(name).await? else {
         return Ok(Vec::new());
      };
      self.select_expr(&expr).await
   }

   /// Names of the files matched by an expression that is not saved.
   pub async fn select_expr(&mut self, expr: &SelectionExpr) -> Result<Vec<String>> {
      let predicate = compile(expr);
      let sql = format!(
         "SELECT files.name FROM files WHERE {} ORDER BY files.id",
         predicate.sql
      );
      trace!(sql = %sql, binds = predicate.binds.len(), "Running selection");

      let mut query = sqlx::query_scalar::<_, String>(&sql);
      for value in predicate.binds {
         query = match value {
            Bind::Int(id) => query.bind(id),
            Bind::Text(text) => query.bind(text),
         };
      }

      let names = query.fetch_all(&mut *self.conn).await?;
      Ok(names)
   }

   /// Whether one file, given by id or name, is matched by a selection.
   ///
   /// A file name resolves to the oldest file with that name, as everywhere
   /// else, so a name and its id always agree.
   pub async fn matches(&mut self, name: &str, file: impl Into<EntityRef>) -> Result<bool> {
      let file: EntityRef = file.into();
      let Some(expr) = self.expression(name).await? else {
         return Ok(false);
      };
      let Some(file_id) = resolve::file_id(&mut *self.conn, &file).await? else {
         return Ok(false);
      };

      let predicate = compile(&expr);
      let sql = format!(
         "SELECT EXISTS(SELECT 1 FROM files WHERE files.id = ? AND {})",
         predicate.sql
      );

      let mut query = sqlx::query_scalar::<_, bool>(&sql).bind(file_id);
      for value in predicate.binds {
         query = match value {
            Bind::Int(id) => query.bind(id),
            Bind::Text(text) => query.bind(text),
         };
      }

      let found = query.fetch_one(&mut *self.conn).await?;
      Ok(found)
   }
}
