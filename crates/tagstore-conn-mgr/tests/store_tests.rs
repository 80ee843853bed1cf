use std::time::Duration;

use sqlx::Row;
use tagstore_conn_mgr::{Error, SCHEMA, SqliteStore, StoreConfig};
use tempfile::TempDir;

async fn table_names(conn: &mut sqlx::SqliteConnection) -> Vec<String> {
   sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
      .fetch_all(conn)
      .await
      .unwrap()
      .iter()
      .map(|row| row.get::<String, _>("name"))
      .collect()
}

#[tokio::test]
async fn open_creates_file_and_schema() {
   let temp = TempDir::new().unwrap();
   let path = temp.path().join("nested").join("tags.db");

   let store = SqliteStore::open(&path, None).await.unwrap();
   assert!(path.exists());

   let mut conn = store.connect().await.unwrap();
   assert_eq!(
      table_names(&mut conn).await,
      vec!["files", "options", "selections", "tag_files", "tags"]
   );
}

#[tokio::test]
async fn schema_is_idempotent() {
   let temp = TempDir::new().unwrap();
   let path = temp.path().join("tags.db");

   let store = SqliteStore::open(&path, None).await.unwrap();
   let mut conn = store.connect().await.unwrap();
   sqlx::query("INSERT INTO tags(name) VALUES ('kept')")
      .execute(&mut *conn)
      .await
      .unwrap();

   // Re-running the script, directly and through a second open, leaves data alone
   tagstore_conn_mgr::apply_schema(&mut conn).await.unwrap();
   drop(conn);
   let store = SqliteStore::open(&path, None).await.unwrap();
   let mut conn = store.connect().await.unwrap();

   let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags")
      .fetch_one(&mut *conn)
      .await
      .unwrap();
   assert_eq!(count, 1);
   assert_eq!(SCHEMA.len(), 7);
}

#[tokio::test]
async fn missing_file_without_create_fails() {
   let temp = TempDir::new().unwrap();
   let config = StoreConfig {
      create_if_missing: false,
      ..Default::default()
   };

   let err = SqliteStore::open(temp.path().join("absent.db"), Some(config))
      .await
      .unwrap_err();
   assert!(matches!(err, Error::Sqlx(_)));
}

#[tokio::test]
async fn closed_store_refuses_new_connections() {
   let temp = TempDir::new().unwrap();
   let store = SqliteStore::open(temp.path().join("tags.db"), None)
      .await
      .unwrap();

   let mut open = store.connect().await.unwrap();
   store.close();
   assert!(store.is_closed());
   assert!(matches!(store.connect().await, Err(Error::StoreClosed)));

   // Connections handed out before close keep working
   sqlx::query("SELECT 1").execute(&mut *open).await.unwrap();
   open.close().await.unwrap();
}

#[tokio::test]
async fn workers_get_distinct_connections() {
   let temp = TempDir::new().unwrap();
   let store = SqliteStore::open(
      temp.path().join("tags.db"),
      Some(StoreConfig {
         busy_timeout: Duration::from_millis(500),
         ..Default::default()
      }),
   )
   .await
   .unwrap();

   let mut first = store.connect().await.unwrap();
   let mut second = store.connect().await.unwrap();
   assert_ne!(first.worker_id(), second.worker_id());

   sqlx::query("INSERT INTO files(name, path) VALUES ('a', '/a')")
      .execute(&mut *first)
      .await
      .unwrap();

   // A committed write on one worker is visible to the other immediately
   let names: Vec<String> = sqlx::query_scalar("SELECT name FROM files")
      .fetch_all(&mut *second)
      .await
      .unwrap();
   assert_eq!(names, vec!["a"]);
}

#[tokio::test]
async fn unwritable_parent_is_an_io_error() {
   let temp = TempDir::new().unwrap();
   let blocker = temp.path().join("blocker");
   std::fs::write(&blocker, b"not a directory").unwrap();

   let err = SqliteStore::open(blocker.join("sub").join("tags.db"), None)
      .await
      .unwrap_err();
   assert!(matches!(err, Error::Io(_)), "{err:?}");
}
