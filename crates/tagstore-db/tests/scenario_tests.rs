mod common;

use common::{create_test_store, links_referencing};
use tagstore_db::TagStore;
use tempfile::TempDir;

#[tokio::test]
async fn photo_lifecycle() {
   let (_store, mut session, _temp) = create_test_store().await;

   assert!(session.tags().create("photo").await.unwrap());
   assert!(session.files().create("a.jpg", "/pics/a.jpg").await.unwrap());
   assert!(session.files().add_tag("a.jpg", "photo").await.unwrap());

   assert!(session.files().has_tag("a.jpg", "photo").await.unwrap());
   assert_eq!(
      session.files().get_by_tag("photo").await.unwrap(),
      vec!["a.jpg"]
   );

   let photo = session.tags().get_id("photo").await.unwrap().unwrap();
   session
      .selections()
      .create("by_id", &format!("#{photo}"))
      .await
      .unwrap();
   session.selections().create("by_name", "photo").await.unwrap();
   assert!(session.selections().matches("by_id", "a.jpg").await.unwrap());

   assert!(session.tags().remove("photo").await.unwrap());

   assert_eq!(session.tags().get_id("photo").await.unwrap(), None);
   assert!(!session.files().has_tag("a.jpg", "photo").await.unwrap());
   assert_eq!(links_referencing(&mut session, "tag_id", photo).await, 0);
   assert!(session.selections().select("by_id").await.unwrap().is_empty());
   assert!(session.selections().select("by_name").await.unwrap().is_empty());
   assert!(!session.selections().matches("by_id", "a.jpg").await.unwrap());
}

#[tokio::test]
async fn options_store() {
   let (_store, mut session, _temp) = create_test_store().await;
   let mut options = session.options();

   assert_eq!(options.get("base_dir").await.unwrap(), None);
   options.set("base_dir", "/srv/files").await.unwrap();
   options.set("base_dir", "/srv/other").await.unwrap();
   options.set("allow_other", "1").await.unwrap();

   assert_eq!(
      options.get("base_dir").await.unwrap().as_deref(),
      Some("/srv/other")
   );
   assert_eq!(
      options.all_names().await.unwrap(),
      vec!["allow_other", "base_dir"]
   );

   assert!(options.unset("base_dir").await.unwrap());
   assert!(!options.unset("base_dir").await.unwrap());
   assert_eq!(options.get("base_dir").await.unwrap(), None);
}

#[tokio::test]
async fn data_survives_reopen() {
   let temp = TempDir::new().unwrap();
   let path = temp.path().join("tags.db");

   {
      let store = TagStore::open(&path, None).await.unwrap();
      let mut session = store.session().await.unwrap();
      session.files().create("a.jpg", "/a.jpg").await.unwrap();
      session.files().set_tags("a.jpg", ["photo"]).await.unwrap();
      session.close().await.unwrap();
   }

   let store = TagStore::open(&path, None).await.unwrap();
   let mut session = store.session().await.unwrap();
   assert_eq!(
      session.files().get_tags("a.jpg").await.unwrap(),
      vec!["photo"]
   );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn workers_write_concurrently() {
   let (store, mut session, _temp) = create_test_store().await;
   session.files().create("shared", "/shared").await.unwrap();

   let mut handles = Vec::new();
   for worker in 0..4 {
      let store = store.clone();
      handles.push(tokio::spawn(async move {
         // Each worker owns its session for its whole lifetime
         let mut session = store.session().await.unwrap();
         for i in 0..10 {
            let name = format!("w{worker}-{i}");
            session.files().create(&name, "/x").await.unwrap();
            session
               .files()
               .set_tags(name.as_str(), ["common", name.as_str()])
               .await
               .unwrap();
            session.files().add_tag("shared", name.as_str()).await.unwrap();
         }
         session.worker_id()
      }));
   }

   let mut worker_ids = Vec::new();
   for handle in handles {
      worker_ids.push(handle.await.unwrap());
   }
   worker_ids.sort();
   worker_ids.dedup();
   assert_eq!(worker_ids.len(), 4);

   assert_eq!(session.files().get_by_tag("common").await.unwrap().len(), 40);
   assert_eq!(session.files().get_tags("shared").await.unwrap().len(), 40);
   // "common" was auto-created exactly once despite the races
   let tags = session.tags().all_names().await.unwrap();
   assert_eq!(tags.iter().filter(|t| *t == "common").count(), 1);
   assert_eq!(tags.len(), 41);
}
