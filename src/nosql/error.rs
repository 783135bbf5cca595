//! Document store error types
//!
//! A single error type is shared by every backend so that callers can handle
//! store failures without knowing which backend produced them.

use thiserror::Error;

/// Result type for document store operations
pub type Result<T> = std::result::Result<T, NoSQLError>;

/// Unified error type for document store operations
#[derive(Debug, Error)]
pub enum NoSQLError {
	/// Could not reach or configure the server
	#[error("Connection error: {0}")]
	ConnectionError(String),

	/// Query/operation execution error
	#[error("Execution error: {0}")]
	ExecutionError(String),

	/// Invalid operation for the current backend
	#[error("Invalid operation: {0}")]
	InvalidOperation(String),

	/// Configuration error
	#[error("Configuration error: {0}")]
	ConfigError(String),

	/// Authentication error
	#[error("Authentication error: {0}")]
	AuthenticationError(String),

	/// Database-specific error (contains the original error message)
	#[error("Database error: {0}")]
	DatabaseError(String),
}

impl From<mongodb::error::Error> for NoSQLError {
	fn from(err: mongodb::error::Error) -> Self {
		use mongodb::error::ErrorKind;

		match *err.kind {
			ErrorKind::Authentication { .. } => NoSQLError::AuthenticationError(err.to_string()),
			ErrorKind::InvalidArgument { .. } => NoSQLError::InvalidOperation(err.to_string()),
			ErrorKind::Io(_) => NoSQLError::ConnectionError(err.to_string()),
			_ => NoSQLError::DatabaseError(err.to_string()),
		}
	}
}
