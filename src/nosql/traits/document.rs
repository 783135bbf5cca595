//! Document-oriented database trait
//!
//! Filters are BSON documents whose top-level keys must all match exactly.
//! Updates use MongoDB's `$set` operator.

use async_trait::async_trait;

use super::super::error::Result;
use super::super::traits::NoSQLBackend;
use super::super::types::{Document, UpdateResult};

/// Trait for document-oriented stores
///
/// # Example
///
/// ```rust,no_run
/// use issue_tracker::nosql::{DocumentBackend, Result};
/// use bson::{Document, doc};
///
/// async fn find_issue(db: &dyn DocumentBackend, title: &str) -> Result<Option<Document>> {
///     db.find_one("issues", doc! { "issue_title": title }).await
/// }
/// ```
#[async_trait]
pub trait DocumentBackend: NoSQLBackend {
	/// Finds a single document matching the filter
	///
	/// Returns `Some(Document)` if a matching document is found, `None` otherwise.
	async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>>;

	/// Finds all documents matching the filter, in insertion order
	async fn find_many(&self, collection: &str, filter: Document) -> Result<Vec<Document>>;

	/// Inserts a single document into the collection
	///
	/// A document without an `_id` is assigned a fresh ObjectId. Returns the
	/// id of the inserted document as a hex string.
	async fn insert_one(&self, collection: &str, document: Document) -> Result<String>;

	/// Updates at most one document matching the filter
	///
	/// # Example
	///
	/// ```rust,ignore
	/// let result = db.update_one(
	///     "issues",
	///     doc! { "_id": id, "project": "apitest" },
	///     doc! { "$set": { "open": false } }
	/// ).await?;
	/// ```
	async fn update_one(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
	) -> Result<UpdateResult>;

	/// Deletes at most one document matching the filter
	///
	/// Returns the number of documents deleted (0 or 1).
	async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64>;
}
