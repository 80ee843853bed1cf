//! Command layer over [`tagstore_db`].
//!
//! Every store operation is registered once in [`COMMANDS`] under its entity
//! kind and name, so front ends can list, look up, and run operations by
//! name without knowing the handle API:
//!
//! ```no_run
//! use tagstore::{TagStore, dispatch};
//!
//! # async fn example() -> tagstore::Result<()> {
//! let store = TagStore::open("tags.db", None).await?;
//! let mut session = store.session().await?;
//!
//! dispatch(&mut session, "tags", "new", vec!["photo".into()]).await?;
//! let output = dispatch(&mut session, "tags", "all_names", Vec::new()).await?;
//! println!("{output}");
//! # Ok(())
//! # }
//! ```

mod commands;
mod error;

pub use commands::{
   Args, Arity, COMMANDS, Command, CommandFuture, EntityKind, Handler, Output, commands_for,
   dispatch, lookup,
};
pub use error::{Error, Result};

// Re-export the store so callers need only this crate
pub use tagstore_db::{Session, StoreConfig, TagStore};
