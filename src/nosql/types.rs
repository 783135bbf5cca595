//! Value types shared by the document store traits.

/// Re-exported so callers do not need a direct `bson` import for the common case.
pub use bson::Document;

/// Identifies which backend implementation is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSQLBackendType {
	/// MongoDB server
	MongoDB,
	/// Process-local store
	InMemory,
}

impl std::fmt::Display for NoSQLBackendType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			NoSQLBackendType::MongoDB => write!(f, "mongodb"),
			NoSQLBackendType::InMemory => write!(f, "in-memory"),
		}
	}
}

/// Outcome of an update operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
	/// Number of documents that matched the filter
	pub matched_count: u64,
	/// Number of documents actually changed
	pub modified_count: u64,
}

impl UpdateResult {
	pub fn new(matched_count: u64, modified_count: u64) -> Self {
		Self {
			matched_count,
			modified_count,
		}
	}
}
