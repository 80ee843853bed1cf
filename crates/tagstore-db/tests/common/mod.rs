use tagstore_db::{Session, TagStore};
use tempfile::TempDir;

pub async fn create_test_store() -> (TagStore, Session, TempDir) {
   let temp_dir = TempDir::new().expect("Failed to create temp directory");
   let store = TagStore::open(temp_dir.path().join("tags.db"), None)
      .await
      .expect("Failed to open test store");
   let session = store.session().await.expect("Failed to open session");

   (store, session, temp_dir)
}

/// Number of link rows whose `column` (`tag_id` or `file_id`) equals `id`.
#[allow(dead_code)]
pub async fn links_referencing(session: &mut Session, column: &str, id: i64) -> i64 {
   let sql = format!("SELECT COUNT(*) FROM tag_files WHERE {column} = ?");
   sqlx::query_scalar::<_, i64>(&sql)
      .bind(id)
      .fetch_one(session.connection())
      .await
      .unwrap()
}
