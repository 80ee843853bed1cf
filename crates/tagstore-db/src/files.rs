use sqlx::sqlite::SqliteConnection;
use tracing::{debug, trace};

use crate::reference::EntityRef;
use crate::{Result, resolve, transaction};

/// Operations on registered files and their tag links.
///
/// Obtained from [`Session::files`](crate::Session::files). File names are
/// not unique; a name reference resolves to the oldest file with that name.
pub struct Files<'c> {
   conn: &'c mut SqliteConnection,
}

impl<'c> Files<'c> {
   pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
      Self { conn }
   }

   /// Register a file alias. Duplicate names are accepted.
   pub async fn create(&mut self, name: &str, path: &str) -> Result<bool> {
      let result = sqlx::query("INSERT INTO files(name, path) VALUES (?, ?)")
         .bind(name)
         .bind(path)
         .execute(&mut *self.conn)
         .await?;

      debug!(file = name, id = result.last_insert_rowid(), "Created file");
      Ok(true)
   }

   /// Remove a file and all of its tag links.
   ///
   /// The lookup and both deletes run in one write transaction. Returns
   /// `Ok(false)` when no stored file matches.
   pub async fn remove(&mut self, file: impl Into<EntityRef>) -> Result<bool> {
      let file: EntityRef = file.into();

      transaction::begin(&mut *self.conn).await?;
      let outcome = delete_file(&mut *self.conn, &file).await;
      let Some((id, links)) = transaction::finish(&mut *self.conn, outcome).await? else {
         return Ok(false);
      };

      debug!(file = %file, id, links, "Removed file");
      Ok(true)
   }

   /// Rename a file given by name or id. Returns whether a row changed.
   pub async fn rename(&mut self, src: impl Into<EntityRef>, dst: &str) -> Result<bool> {
      let src: EntityRef = src.into();
      let result = match src {
         EntityRef::Id(id) => {
            sqlx::query("UPDATE files SET name = ? WHERE id = ?")
               .bind(dst)
               .bind(id)
               .execute(&mut *self.conn)
               .await?
         }
         EntityRef::Name(name) => {
            sqlx::query("UPDATE files SET name = ? WHERE name = ?")
               .bind(dst)
               .bind(name)
               .execute(&mut *self.conn)
               .await?
         }
      };

      Ok(result.rows_affected() > 0)
   }

   pub async fn get_id(&mut self, file: impl Into<EntityRef>) -> Result<Option<i64>> {
      resolve::file_id(&mut *self.conn, &file.into()).await
   }

   pub async fn get_name(&mut self, file: impl Into<EntityRef>) -> Result<Option<String>> {
      resolve::file_name(&mut *self.conn, &file.into()).await
   }

   pub async fn exists(&mut self, file: impl Into<EntityRef>) -> Result<bool> {
      let file: EntityRef = file.into();
      match file {
         EntityRef::Id(id) => {
            let found = sqlx::query_scalar::<_, bool>(
               "SELECT EXISTS(SELECT 1 FROM files WHERE id = ?)",
            )
            .bind(id)
            .fetch_one(&mut *self.conn)
            .await?;
            Ok(found)
         }
         file => Ok(resolve::file_id(&mut *self.conn, &file).await?.is_some()),
      }
   }

   /// Names of all files, in registration order. Duplicates appear once per file.
   pub async fn all_names(&mut self) -> Result<Vec<String>> {
      let names = sqlx::query_scalar::<_, String>("SELECT name FROM files ORDER BY id")
         .fetch_all(&mut *self.conn)
         .await?;
      Ok(names)
   }

   pub async fn all_ids(&mut self) -> Result<Vec<i64>> {
      let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM files ORDER BY id")
         .fetch_all(&mut *self.conn)
         .await?;
      Ok(ids)
   }

   /// Registered path of a file.
   pub async fn resolve(&mut self, file: impl Into<EntityRef>) -> Result<Option<String>> {
      let file: EntityRef = file.into();
      let path = match file {
         EntityRef::Id(id) => {
            sqlx::query_scalar::<_, Option<String>>("SELECT path FROM files WHERE id = ?")
               .bind(id)
               .fetch_optional(&mut *self.conn)
               .await?
         }
         EntityRef::Name(name) => {
            sqlx::query_scalar::<_, Option<String>>(
               "SELECT path FROM files WHERE name = ? ORDER BY id LIMIT 1",
            )
            .bind(name)
            .fetch_optional(&mut *self.conn)
            .await?
         }
      };
      Ok(path.flatten())
   }

   /// Names of the files carrying `tag`.
   ///
   /// The virtual tag lists every file without touching the link table. A link
   /// row that was added twice lists its file twice.
   pub async fn get_by_tag(&mut self, tag: impl Into<EntityRef>) -> Result<Vec<String>> {
      let tag: EntityRef = tag.into();
      if tag.is_all_tag() {
         return self.all_names().await;
      }

      let Some(tag_id) = resolve::tag_id(&mut *self.conn, &tag).await? else {
         return Ok(Vec::new());
      };

      let names = sqlx::query_scalar::<_, String>(
         r#"
         SELECT files.name FROM files
         INNER JOIN tag_files ON tag_files.file_id = files.id
         WHERE tag_files.tag_id = ?
         ORDER BY files.id
         "#,
      )
      .bind(tag_id)
      .fetch_all(&mut *self.conn)
      .await?;
      Ok(names)
   }

   /// Link a tag to a file.
   ///
   /// Returns `Ok(false)` for the virtual tag or when either side is not
   /// stored. The insert checks both rows in the same statement, so a link
   /// is never written for a file or tag removed concurrently. Linking twice
   /// stores two link rows.
   pub async fn add_tag(
      &mut self,
      file: impl Into<EntityRef>,
      tag: impl Into<EntityRef>,
   ) -> Result<bool> {
      let Some((file_id, tag_id)) = self.link_ids(file.into(), tag.into()).await? else {
         return Ok(false);
      };

      let result = sqlx::query(
         r#"
         INSERT INTO tag_files(tag_id, file_id)
         SELECT tags.id, files.id FROM tags, files
         WHERE tags.id = ? AND files.id = ?
         "#,
      )
      .bind(tag_id)
      .bind(file_id)
      .execute(&mut *self.conn)
      .await?;

      let linked = result.rows_affected() > 0;
      trace!(file_id, tag_id, linked, "Linked tag");
      Ok(linked)
   }

   /// Unlink a tag from a file, removing every duplicate link row.
   ///
   /// Returns `Ok(false)` for the virtual tag or when either name does not resolve.
   pub async fn remove_tag(
      &mut self,
      file: impl Into<EntityRef>,
      tag: impl Into<EntityRef>,
   ) -> Result<bool> {
      let Some((file_id, tag_id)) = self.link_ids(file.into(), tag.into()).await? else {
         return Ok(false);
      };

      sqlx::query("DELETE FROM tag_files WHERE tag_id = ? AND file_id = ?")
         .bind(tag_id)
         .bind(file_id)
         .execute(&mut *self.conn)
         .await?;

      trace!(file_id, tag_id, "Unlinked tag");
      Ok(true)
   }

   /// Whether the file carries the tag. Always true for the virtual tag.
   pub async fn has_tag(
      &mut self,
      file: impl Into<EntityRef>,
      tag: impl Into<EntityRef>,
   ) -> Result<bool> {
      let tag: EntityRef = tag.into();
      if tag.is_all_tag() {
         return Ok(true);
      }

      let Some((file_id, tag_id)) = self.link_ids(file.into(), tag).await? else {
         return Ok(false);
      };

      let found = sqlx::query_scalar::<_, bool>(
         "SELECT EXISTS(SELECT 1 FROM tag_files WHERE tag_id = ? AND file_id = ?)",
      )
      .bind(tag_id)
      .bind(file_id)
      .fetch_one(&mut *self.conn)
      .await?;
      Ok(found)
   }

   /// Names of the tags linked to a file, in link order.
   pub async fn get_tags(&mut self, file: impl Into<EntityRef>) -> Result<Vec<String>> {
      let Some(file_id) = resolve::file_id(&mut *self.conn, &file.into()).await? else {
         return Ok(Vec::new());
      };

      let names = sqlx::query_scalar::<_, String>(
         r#"
         SELECT tags.name FROM tag_files
         INNER JOIN tags ON tags.id = tag_files.tag_id
         WHERE tag_files.file_id = ?
         ORDER BY tag_files.rowid
         "#,
      )
      .bind(file_id)
      .fetch_all(&mut *self.conn)
      .await?;
      Ok(names)
   }

   /// Replace every tag link of a file with `tags`.
   ///
   /// Tag names that do not exist yet are created; tag ids that are not
   /// stored are skipped, as is the virtual tag. The file lookup and the whole
   /// replacement commit as one transaction; an empty list clears the file's
   /// tags. Returns `Ok(false)` when no stored file matches.
   pub async fn set_tags<I, T>(&mut self, file: impl Into<EntityRef>, tags: I) -> Result<bool>
   where
      I: IntoIterator<Item = T>,
      T: Into<EntityRef>,
   {
      let file: EntityRef = file.into();
      let tags: Vec<EntityRef> = tags.into_iter().map(Into::into).collect();

      transaction::begin(&mut *self.conn).await?;
      let outcome = replace_tags(&mut *self.conn, &file, &tags).await;
      let Some(file_id) = transaction::finish(&mut *self.conn, outcome).await? else {
         return Ok(false);
      };

      debug!(file_id, tags = tags.len(), "Replaced file tags");
      Ok(true)
   }

   /// Resolve both sides of a link, or `None` if the link cannot exist.
   async fn link_ids(&mut self, file: EntityRef, tag: EntityRef) -> Result<Option<(i64, i64)>> {
      if tag.is_all_tag() {
         return Ok(None);
      }

      let Some(tag_id) = resolve::tag_id(&mut *self.conn, &tag).await? else {
         return Ok(None);
      };
      let Some(file_id) = resolve::file_id(&mut *self.conn, &file).await? else {
         return Ok(None);
      };

      Ok(Some((file_id, tag_id)))
   }
}

/// Deletes the links first, then the file row. Returns the file id and the
/// number of links removed, or `None` if the file is not stored.
async fn delete_file(conn: &mut SqliteConnection, file: &EntityRef) -> Result<Option<(i64, u64)>> {
   let Some(id) = resolve::existing_file_id(&mut *conn, file).await? else {
      return Ok(None);
   };

   let links = sqlx::query("DELETE FROM tag_files WHERE file_id = ?")
      .bind(id)
      .execute(&mut *conn)
      .await?;
   sqlx::query("DELETE FROM files WHERE id = ?")
      .bind(id)
      .execute(&mut *conn)
      .await?;
   Ok(Some((id, links.rows_affected())))
}

/// Returns the file id, or `None` without writing if the file is not stored.
async fn replace_tags(
   conn: &mut SqliteConnection,
   file: &EntityRef,
   tags: &[EntityRef],
) -> Result<Option<i64>> {
   let Some(file_id) = resolve::existing_file_id(&mut *conn, file).await? else {
      return Ok(None);
   };

   sqlx::query("DELETE FROM tag_files WHERE file_id = ?")
      .bind(file_id)
      .execute(&mut *conn)
      .await?;

   for tag in tags {
      if tag.is_all_tag() {
         continue;
      }

      let tag_id = match tag {
         EntityRef::Id(_) => match resolve::existing_tag_id(&mut *conn, tag).await? {
            Some(id) => id,
            None => continue,
         },
         EntityRef::Name(name) => match resolve::tag_id(&mut *conn, tag).await? {
            Some(id) => id,
            None => {
               let created = sqlx::query("INSERT INTO tags(name) VALUES (?)")
                  .bind(name)
                  .execute(&mut *conn)
                  .await?;
               debug!(tag = %name, "Created tag while replacing file tags");
               created.last_insert_rowid()
            }
         },
      };

      sqlx::query("INSERT INTO tag_files(tag_id, file_id) VALUES (?, ?)")
         .bind(tag_id)
         .bind(file_id)
         .execute(&mut *conn)
         .await?;
   }

   Ok(Some(file_id))
}
