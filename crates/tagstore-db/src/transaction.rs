//! Multi-statement atomicity for handle operations.
//!
//! A handle that needs several statements calls [`begin`], runs its
//! statements against the same connection, and hands the outcome to
//! [`finish`], which commits on success and rolls back on failure.

use sqlx::sqlite::SqliteConnection;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Start a write transaction.
///
/// `IMMEDIATE` takes the write lock up front, so a concurrent writer waits on
/// the busy timeout here instead of failing halfway through the sequence.
pub(crate) async fn begin(conn: &mut SqliteConnection) -> Result<()> {
   sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
   Ok(())
}

/// Commit or roll back depending on `outcome`.
pub(crate) async fn finish<T>(conn: &mut SqliteConnection, outcome: Result<T>) -> Result<T> {
   let error = match outcome {
      Ok(value) => match sqlx::query("COMMIT").execute(&mut *conn).await {
         Ok(_) => {
            debug!("Transaction committed");
            return Ok(value);
         }
         // A failed COMMIT leaves the transaction open
         Err(e) => Error::from(e),
      },
      Err(e) => e,
   };

   match sqlx::query("ROLLBACK").execute(&mut *conn).await {
      Ok(_) => {
         debug!(error = %error, "Transaction rolled back");
         Err(error)
      }
      Err(rollback_err) => {
         warn!(error = %error, rollback_error = %rollback_err, "Rollback failed");
         Err(Error::TransactionRollbackFailed {
            transaction_error: error.to_string(),
            rollback_error: rollback_err.to_string(),
         })
      }
   }
}
