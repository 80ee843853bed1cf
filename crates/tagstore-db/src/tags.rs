use sqlx::sqlite::SqliteConnection;
use tracing::debug;

use crate::reference::{ALL_TAG, EntityRef};
use crate::{Result, resolve, transaction};

/// Operations on tags.
///
/// Obtained from [`Session::tags`](crate::Session::tags).
pub struct Tags<'c> {
   conn: &'c mut SqliteConnection,
}

impl<'c> Tags<'c> {
   pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
      Self { conn }
   }

   /// Create a tag.
   ///
   /// Returns `Ok(false)` without inserting for the reserved [`ALL_TAG`] name.
   /// A name that already exists fails with the engine's UNIQUE violation.
   pub async fn create(&mut self, name: &str) -> Result<bool> {
      if name == ALL_TAG {
         return Ok(false);
      }

      let result = sqlx::query("INSERT INTO tags(name) VALUES (?)")
         .bind(name)
         .execute(&mut *self.conn)
         .await?;

      debug!(tag = name, id = result.last_insert_rowid(), "Created tag");
      Ok(true)
   }

   /// Remove a tag and every link that references it.
   ///
   /// The lookup and both deletes run in one write transaction. Returns
   /// `Ok(false)` for the virtual tag and when no stored tag matches.
   pub async fn remove(&mut self, tag: impl Into<EntityRef>) -> Result<bool> {
      let tag: EntityRef = tag.into();
      if tag.is_all_tag() {
         return Ok(false);
      }

      transaction::begin(&mut *self.conn).await?;
      let outcome = delete_tag(&mut *self.conn, &tag).await;
      let Some((id, links)) = transaction::finish(&mut *self.conn, outcome).await? else {
         return Ok(false);
      };

      debug!(tag = %tag, id, links, "Removed tag");
      Ok(true)
   }

   /// Rename a tag given by name or id.
   ///
   /// Returns `Ok(false)` if either side is [`ALL_TAG`] or nothing was renamed.
   pub async fn rename(&mut self, src: impl Into<EntityRef>, dst: &str) -> Result<bool> {
      let src: EntityRef = src.into();
      if src.is_all_tag() || dst == ALL_TAG {
         return Ok(false);
      }

      let result = match &src {
         EntityRef::Id(id) => {
            sqlx::query("UPDATE tags SET name = ? WHERE id = ?")
               .bind(dst)
               .bind(id)
               .execute(&mut *self.conn)
               .await?
         }
         EntityRef::Name(name) => {
            sqlx::query("UPDATE tags SET name = ? WHERE name = ?")
               .bind(dst)
               .bind(name)
               .execute(&mut *self.conn)
               .await?
         }
      };

      Ok(result.rows_affected() > 0)
   }

   /// Id of a tag. Ids pass through unchecked; [`ALL_TAG`] is always `-1`.
   pub async fn get_id(&mut self, tag: impl Into<EntityRef>) -> Result<Option<i64>> {
      resolve::tag_id(&mut *self.conn, &tag.into()).await
   }

   /// Name of a tag. Names pass through unchecked.
   pub async fn get_name(&mut self, tag: impl Into<EntityRef>) -> Result<Option<String>> {
      resolve::tag_name(&mut *self.conn, &tag.into()).await
   }

   /// Whether the tag exists. The virtual tag always does.
   pub async fn exists(&mut self, tag: impl Into<EntityRef>) -> Result<bool> {
      let tag: EntityRef = tag.into();
      match tag {
         _ if tag.is_all_tag() => Ok(true),
         EntityRef::Id(id) => {
            let found = sqlx::query_scalar::<_, bool>(
               "SELECT EXISTS(SELECT 1 FROM tags WHERE id = ?)",
            )
            .bind(id)
            .fetch_one(&mut *self.conn)
            .await?;
            Ok(found)
         }
         EntityRef::Name(_) => Ok(resolve::tag_id(&mut *self.conn, &tag).await?.is_some()),
      }
   }

   /// Names of all stored tags, in creation order.
   pub async fn all_names(&mut self) -> Result<Vec<String>> {
      let names = sqlx::query_scalar::<_, String>("SELECT name FROM tags ORDER BY id")
         .fetch_all(&mut *self.conn)
         .await?;
      Ok(names)
   }

   /// Ids of all stored tags, ascending.
   pub async fn all_ids(&mut self) -> Result<Vec<i64>> {
      let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM tags ORDER BY id")
         .fetch_all(&mut *self.conn)
         .await?;
      Ok(ids)
   }
}

/// Deletes the links first, then the tag row. Returns the tag id and the
/// number of links removed, or `None` if the tag is not stored.
async fn delete_tag(conn: &mut SqliteConnection, tag: &EntityRef) -> Result<Option<(i64, u64)>> {
   let Some(id) = resolve::existing_tag_id(&mut *conn, tag).await? else {
      return Ok(None);
   };

   let links = sqlx::query("DELETE FROM tag_files WHERE tag_id = ?")
      .bind(id)
      .execute(&mut *conn)
      .await?;
   sqlx::query("DELETE FROM tags WHERE id = ?")
      .bind(id)
      .execute(&mut *conn)
      .await?;
   Ok(Some((id, links.rows_affected())))
}
