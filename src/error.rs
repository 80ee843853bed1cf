/// Result type alias for command execution.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while dispatching a command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from the tag store itself.
   #[error(transparent)]
   Store(#[from] tagstore_db::Error),

   /// Entity kind is not one of `tags`, `files`, `options`, `selections`.
   #[error("unknown entity: {0}")]
   UnknownEntity(String),

   /// No command with this name exists for the entity.
   #[error("unknown command: {entity} {command}")]
   UnknownCommand { entity: String, command: String },

   /// Wrong number or form of arguments.
   #[error("{command}: {message}")]
   InvalidArguments { command: String, message: String },
}

impl Error {
   /// Machine-readable error code.
   pub fn error_code(&self) -> String {
      match self {
         Error::Store(e) => e.error_code(),
         Error::UnknownEntity(_) => "UNKNOWN_ENTITY".to_string(),
         Error::UnknownCommand { .. } => "UNKNOWN_COMMAND".to_string(),
         Error::InvalidArguments { .. } => "INVALID_ARGUMENTS".to_string(),
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn codes_and_messages() {
      let err = Error::InvalidArguments {
         command: "tags new".into(),
         message: "expected 1 argument, got 0".into(),
      };
      assert_eq!(err.error_code(), "INVALID_ARGUMENTS");
      assert_eq!(err.to_string(), "tags new: expected 1 argument, got 0");
   }

   #[test]
   fn store_errors_keep_their_code() {
      let err = Error::from(tagstore_db::Error::InvalidSelection {
         position: 3,
         message: "unexpected character".into(),
      });
      assert_eq!(err.error_code(), "INVALID_SELECTION");
   }
}
