use thiserror::Error;

use crate::nosql::NoSQLError;

/// Errors produced by the issues app
#[derive(Debug, Error)]
pub enum IssueError {
	/// A payload field is missing, empty or has the wrong type
	#[error("Validation error: {0}")]
	Validation(String),

	/// The `_id` is not a 24-digit hex object id
	#[error("Invalid issue id: {0}")]
	InvalidId(String),

	/// The document store failed
	#[error("Store error: {0}")]
	Store(#[from] NoSQLError),

	/// A stored document cannot be decoded into an issue
	#[error("Corrupt issue document: {0}")]
	Corrupt(String),
}

pub type IssueResult<T> = Result<T, IssueError>;
