//! Custom error types for the common library
//!
//! `DatabaseError` covers connection bootstrap. `AppError` is the taxonomy
//! every user-facing operation reports through: whatever fails below an
//! operation boundary is converted into one of its variants there.

use std::fmt;

use sqlx::Error as SqlxError;
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Boxed error used as the source of operation failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// What an operation was doing when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CheckSession,
    SignIn,
    SignOut,
    LoadProducts,
    AddProduct,
    UpdateProduct,
    DeleteProduct,
    UploadImage,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Action::CheckSession => "check the session",
            Action::SignIn => "sign in",
            Action::SignOut => "sign out",
            Action::LoadProducts => "load products",
            Action::AddProduct => "add product",
            Action::UpdateProduct => "update product",
            Action::DeleteProduct => "delete product",
            Action::UploadImage => "upload image",
        };
        f.write_str(text)
    }
}

/// Error taxonomy of the catalog admin
#[derive(Error, Debug)]
pub enum AppError {
    /// Local, field-scoped rejection; never reaches the network
    #[error("Invalid form: {0}")]
    Validation(#[from] ValidationErrors),

    /// Credential rejection or session-check failure
    #[error("Failed to {action}: {source}")]
    Auth {
        action: Action,
        #[source]
        source: BoxError,
    },

    /// Image upload failure; the enclosing mutation is aborted
    #[error("Failed to {action}: {source}")]
    Upload {
        action: Action,
        #[source]
        source: BoxError,
    },

    /// Select/insert/update/delete failure from the data store
    #[error("Failed to {action}: {source}")]
    Persistence {
        action: Action,
        #[source]
        source: BoxError,
    },

    /// An operation that needs an identity ran without one
    #[error("No authenticated session")]
    NotAuthenticated,

    /// A mutation is already in flight
    #[error("Another operation is still in progress")]
    Busy,

    /// Anything that does not fit the categories above
    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    pub fn auth(action: Action, source: impl Into<BoxError>) -> Self {
        AppError::Auth {
            action,
            source: source.into(),
        }
    }

    pub fn upload(action: Action, source: impl Into<BoxError>) -> Self {
        AppError::Upload {
            action,
            source: source.into(),
        }
    }

    pub fn persistence(action: Action, source: impl Into<BoxError>) -> Self {
        AppError::Persistence {
            action,
            source: source.into(),
        }
    }

    /// Field errors, when this is a validation failure
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            AppError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// Message shown to the user for this failure
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unexpected(_) => "Something went wrong, please try again".to_string(),
            other => other.to_string(),
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_message_names_the_action() {
        let err = AppError::persistence(Action::AddProduct, "duplicate key");
        assert_eq!(err.user_message(), "Failed to add product: duplicate key");
    }

    #[test]
    fn unexpected_errors_get_a_generic_message() {
        let err = AppError::from(anyhow::anyhow!("socket closed"));
        assert_eq!(err.user_message(), "Something went wrong, please try again");
        assert!(err.to_string().contains("socket closed"));
    }

    #[test]
    fn validation_errors_are_exposed() {
        let mut errors = ValidationErrors::default();
        errors.insert("name", "Name is required");
        let err = AppError::from(errors);
        let fields = err.validation_errors().expect("validation errors");
        assert_eq!(fields.get("name"), Some("Name is required"));
        assert!(AppError::Busy.validation_errors().is_none());
    }

    #[test]
    fn source_is_preserved() {
        let err = AppError::auth(Action::SignIn, "Invalid login credentials");
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "Invalid login credentials");
    }
}
