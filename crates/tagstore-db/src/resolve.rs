//! Name/id resolution shared by the tag and file handles.
//!
//! Ids pass through verbatim without an existence check. Names are looked up
//! and a miss yields `None`. For files, whose names are not unique, a name
//! resolves to the lowest matching id.

use sqlx::sqlite::SqliteConnection;

use crate::Result;
use crate::reference::{ALL_TAG, ALL_TAG_ID, EntityRef};

pub(crate) async fn tag_id(conn: &mut SqliteConnection, tag: &EntityRef) -> Result<Option<i64>> {
   match tag {
      EntityRef::Id(id) => Ok(Some(*id)),
      EntityRef::Name(name) if name == ALL_TAG => Ok(Some(ALL_TAG_ID)),
      EntityRef::Name(name) => {
         let id = sqlx::query_scalar::<_, i64>("SELECT id FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
         Ok(id)
      }
   }
}

pub(crate) async fn tag_name(
   conn: &mut SqliteConnection,
   tag: &EntityRef,
) -> Result<Option<String>> {
   match tag {
      EntityRef::Name(name) => Ok(Some(name.clone())),
      EntityRef::Id(ALL_TAG_ID) => Ok(Some(ALL_TAG.to_string())),
      EntityRef::Id(id) => {
         let name = sqlx::query_scalar::<_, String>("SELECT name FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
         Ok(name)
      }
   }
}

pub(crate) async fn file_id(conn: &mut SqliteConnection, file: &EntityRef) -> Result<Option<i64>> {
   match file {
      EntityRef::Id(id) => Ok(Some(*id)),
      EntityRef::Name(name) => {
         let id = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM files WHERE name = ? ORDER BY id LIMIT 1",
         )
         .bind(name)
         .fetch_optional(&mut *conn)
         .await?;
         Ok(id)
      }
   }
}

pub(crate) async fn file_name(
   conn: &mut SqliteConnection,
   file: &EntityRef,
) -> Result<Option<String>> {
   match file {
      EntityRef::Name(name) => Ok(Some(name.clone())),
      EntityRef::Id(id) => {
         let name = sqlx::query_scalar::<_, String>("SELECT name FROM files WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
         Ok(name)
      }
   }
}

/// Id of a stored tag row. Unlike [`tag_id`], an id is checked against the table
/// and the virtual tag never matches.
pub(crate) async fn existing_tag_id(
   conn: &mut SqliteConnection,
   tag: &EntityRef,
) -> Result<Option<i64>> {
   match tag {
      EntityRef::Id(id) => {
         let id = sqlx::query_scalar::<_, i64>("SELECT id FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
         Ok(id)
      }
      _ if tag.is_all_tag() => Ok(None),
      EntityRef::Name(_) => tag_id(conn, tag).await,
   }
}

/// Id of a stored file row. Unlike [`file_id`], an id is checked against the table.
pub(crate) async fn existing_file_id(
   conn: &mut SqliteConnection,
   file: &EntityRef,
) -> Result<Option<i64>> {
   match file {
      EntityRef::Id(id) => {
         let id = sqlx::query_scalar::<_, i64>("SELECT id FROM files WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
         Ok(id)
      }
      EntityRef::Name(_) => file_id(conn, file).await,
   }
}
