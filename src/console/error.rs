use thiserror::Error;

use crate::attributes::AttributeError;
use crate::error::StorageError;

/// Everything a console command can report. `Display` is the exact line
/// printed to the operator; none of these end the session.
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("** class name missing **")]
    ClassNameMissing,

    #[error("** class doesn't exist **")]
    ClassDoesNotExist,

    #[error("** instance id missing **")]
    InstanceIdMissing,

    #[error("** no instance found **")]
    NoInstanceFound,

    #[error("** attribute name missing **")]
    AttributeNameMissing,

    #[error("** value missing **")]
    ValueMissing,

    #[error("** attribute can't be updated **")]
    AttributeImmutable,

    #[error("** attribute doesn't exist **")]
    AttributeDoesNotExist,

    #[error("** invalid value **")]
    InvalidValue,

    /// A required field was left unset; the record is not saved.
    #[error("** {0} not provided **")]
    NotProvided(&'static str),

    /// Strict storage refused a dangling reference.
    #[error("** {} not found **", .0.to_lowercase())]
    ReferenceNotFound(String),

    #[error("** storage error: {0} **")]
    Storage(StorageError),
}

impl From<StorageError> for ConsoleError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::MissingReference { class, .. } => ConsoleError::ReferenceNotFound(class),
            other => ConsoleError::Storage(other),
        }
    }
}

impl From<AttributeError> for ConsoleError {
    fn from(err: AttributeError) -> Self {
        match err {
            AttributeError::Unknown { .. } => ConsoleError::AttributeDoesNotExist,
            AttributeError::Immutable(_) => ConsoleError::AttributeImmutable,
            AttributeError::InvalidValue { .. } => ConsoleError::InvalidValue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(ConsoleError::ClassNameMissing.to_string(), "** class name missing **");
        assert_eq!(ConsoleError::ClassDoesNotExist.to_string(), "** class doesn't exist **");
        assert_eq!(ConsoleError::NotProvided("email").to_string(), "** email not provided **");
    }

    #[test]
    fn test_missing_reference_message() {
        let err: ConsoleError = StorageError::MissingReference {
            class: "State".to_string(),
            id: "x".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "** state not found **");
    }
}
