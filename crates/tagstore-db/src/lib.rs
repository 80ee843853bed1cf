//! # tagstore-db
//!
//! Metadata store for a tag-oriented virtual file browser: files (named path
//! aliases), tags, the many-to-many links between them, mount options, and
//! saved tag selections.
//!
//! ## Core Types
//!
//! - **[`TagStore`]**: An open store file; hands out one [`Session`] per worker
//! - **[`Session`]**: A worker's connection with typed accessors for each entity kind
//! - **[`Tags`]**, **[`Files`]**, **[`Options`]**, **[`Selections`]**: Entity handles
//! - **[`EntityRef`]**: A tag or file given either by name or by numeric id
//! - **[`SelectionExpr`]**: Parsed boolean expression over tag membership
//!
//! ## Conventions
//!
//! - Every mutating call commits before it returns. Calls that run more than one
//!   statement (removing a tag or file, replacing a file's tags) do so inside a
//!   single transaction.
//! - Business-rule rejections return `Ok(false)`; lookups that find nothing return
//!   `Ok(None)` or an empty list. Only storage failures and malformed selection
//!   text are reported as `Err`.
//! - The tag named [`ALL_TAG`] is virtual: it has id [`ALL_TAG_ID`], matches every
//!   file, and can never be created, renamed, removed, or attached.
//!
//! ## Example
//!
//! ```no_run
//! use tagstore_db::TagStore;
//!
//! # async fn example() -> tagstore_db::Result<()> {
//! let store = TagStore::open("tags.db", None).await?;
//! let mut session = store.session().await?;
//!
//! session.tags().create("photo").await?;
//! session.files().create("a.jpg", "/home/me/a.jpg").await?;
//! session.files().add_tag("a.jpg", "photo").await?;
//!
//! session.selections().create("pictures", "photo & !raw").await?;
//! let names = session.selections().select("pictures").await?;
//! assert_eq!(names, vec!["a.jpg"]);
//! # Ok(())
//! # }
//! ```

mod error;
mod files;
mod options;
mod reference;
mod resolve;
pub mod selection;
mod selections;
mod session;
mod tags;
mod transaction;

pub use error::{Error, Result};
pub use files::Files;
pub use options::Options;
pub use reference::{ALL_TAG, ALL_TAG_ID, EntityRef};
pub use selection::SelectionExpr;
pub use selections::Selections;
pub use session::{Session, TagStore};
pub use tags::Tags;

// Re-export connection manager types for callers that configure the store
pub use tagstore_conn_mgr::{SqliteJournalMode, SqliteStore, StoreConfig, WorkerConnection};
