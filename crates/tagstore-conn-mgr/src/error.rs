//! Errors raised while opening a tag store or handing out worker connections

/// Failure to open the store or one of its connections
#[derive(thiserror::Error, Debug)]
pub enum Error {
   /// [`SqliteStore::open`](crate::SqliteStore::open) could not create the
   /// missing parent directories of the store file
   #[error("cannot create store directory: {0}")]
   Io(#[from] std::io::Error),

   /// Opening a connection, setting its pragmas, or applying the schema failed
   #[error("store connection failed: {0}")]
   Sqlx(#[from] sqlx::Error),

   /// [`SqliteStore::close`](crate::SqliteStore::close) was called; workers
   /// that still hold a connection keep it
   #[error("store is closed")]
   StoreClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
