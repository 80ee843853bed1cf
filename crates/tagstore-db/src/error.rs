/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for tag store operations.
///
/// Rejections such as touching the `__ALL__` tag are not errors; they are
/// reported as `Ok(false)` by the handle that refused them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from SQLx operations, including constraint violations such as a
   /// duplicate tag name.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Error from the connection manager.
   #[error(transparent)]
   ConnectionManager(#[from] tagstore_conn_mgr::Error),

   /// Transaction failed and rollback also failed.
   #[error("transaction failed: {transaction_error}; rollback also failed: {rollback_error}")]
   TransactionRollbackFailed {
      transaction_error: String,
      rollback_error: String,
   },

   /// Selection text could not be parsed.
   #[error("invalid selection at offset {position}: {message}")]
   InvalidSelection { position: usize, message: String },
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for error handling.
   pub fn error_code(&self) -> String {
      match self {
         Error::Sqlx(e) => {
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQLITE_{}", code);
            }
            "SQLX_ERROR".to_string()
         }
         Error::ConnectionManager(tagstore_conn_mgr::Error::StoreClosed) => {
            "STORE_CLOSED".to_string()
         }
         Error::ConnectionManager(_) => "CONNECTION_ERROR".to_string(),
         Error::TransactionRollbackFailed { .. } => "TRANSACTION_ROLLBACK_FAILED".to_string(),
         Error::InvalidSelection { .. } => "INVALID_SELECTION".to_string(),
      }
   }

   /// True when the underlying engine rejected a write because of a UNIQUE constraint.
   pub fn is_unique_violation(&self) -> bool {
      match self {
         Error::Sqlx(e) => e
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation()),
         _ => false,
      }
   }

   pub(crate) fn invalid_selection(position: usize, message: impl Into<String>) -> Self {
      Error::InvalidSelection {
         position,
         message: message.into(),
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_transaction_rollback_failed() {
      let err = Error::TransactionRollbackFailed {
         transaction_error: "constraint".into(),
         rollback_error: "busy".into(),
      };
      assert_eq!(err.error_code(), "TRANSACTION_ROLLBACK_FAILED");
      assert!(err.to_string().contains("constraint"));
      assert!(err.to_string().contains("busy"));
   }

   #[test]
   fn test_error_code_invalid_selection() {
      let err = Error::invalid_selection(4, "expected tag");
      assert_eq!(err.error_code(), "INVALID_SELECTION");
      assert_eq!(
         err.to_string(),
         "invalid selection at offset 4: expected tag"
      );
   }

   #[test]
   fn test_error_code_store_closed() {
      let err = Error::ConnectionManager(tagstore_conn_mgr::Error::StoreClosed);
      assert_eq!(err.error_code(), "STORE_CLOSED");
   }

   #[test]
   fn test_error_code_sqlx_non_database() {
      // RowNotFound is not a database error, so no SQLite code
      let err = Error::Sqlx(sqlx::Error::RowNotFound);
      assert_eq!(err.error_code(), "SQLX_ERROR");
      assert!(!err.is_unique_violation());
   }
}
