//! In-memory document store
//!
//! Keeps each collection as an insertion-ordered `Vec<Document>` behind a
//! `parking_lot::RwLock`. Supports the subset of MongoDB query syntax the
//! issue API uses: exact equality on top-level fields for filters, and the
//! `$set` operator for updates.

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::nosql::error::{NoSQLError, Result};
use crate::nosql::traits::{DocumentBackend, NoSQLBackend};
use crate::nosql::types::{NoSQLBackendType, UpdateResult};

/// Process-local document store
///
/// # Example
///
/// ```rust
/// use issue_tracker::nosql::backends::memory::InMemoryBackend;
/// use issue_tracker::nosql::DocumentBackend;
/// use bson::doc;
///
/// # async fn example() -> issue_tracker::nosql::Result<()> {
/// let db = InMemoryBackend::new();
/// db.insert_one("issues", doc! { "project": "apitest", "open": true }).await?;
///
/// let open = db.find_many("issues", doc! { "open": true }).await?;
/// assert_eq!(open.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct InMemoryBackend {
	collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl InMemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of documents currently stored in `collection`.
	pub fn len(&self, collection: &str) -> usize {
		self.collections
			.read()
			.get(collection)
			.map(Vec::len)
			.unwrap_or(0)
	}

	/// Whether `collection` holds no documents.
	pub fn is_empty(&self, collection: &str) -> bool {
		self.len(collection) == 0
	}
}

/// True when every key of `filter` is present in `document` with an equal value.
fn matches_filter(document: &Document, filter: &Document) -> bool {
	filter
		.iter()
		.all(|(key, expected)| document.get(key) == Some(expected))
}

/// Extract the `$set` document from an update, rejecting anything else.
fn set_fields(update: &Document) -> Result<&Document> {
	if let Some(key) = update.keys().find(|key| key.as_str() != "$set") {
		return Err(NoSQLError::InvalidOperation(format!(
			"unsupported update operator: {}",
			key
		)));
	}

	match update.get("$set") {
		Some(Bson::Document(fields)) => Ok(fields),
		Some(_) => Err(NoSQLError::InvalidOperation(
			"$set requires a document".to_string(),
		)),
		None => Err(NoSQLError::InvalidOperation(
			"update document is empty".to_string(),
		)),
	}
}

#[async_trait]
impl NoSQLBackend for InMemoryBackend {
	fn backend_type(&self) -> NoSQLBackendType {
		NoSQLBackendType::InMemory
	}

	async fn health_check(&self) -> Result<()> {
		Ok(())
	}
}

#[async_trait]
impl DocumentBackend for InMemoryBackend {
	async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>> {
		let collections = self.collections.read();
		Ok(collections
			.get(collection)
			.and_then(|docs| docs.iter().find(|doc| matches_filter(doc, &filter)))
			.cloned())
	}

	async fn find_many(&self, collection: &str, filter: Document) -> Result<Vec<Document>> {
		let collections = self.collections.read();
		Ok(collections
			.get(collection)
			.map(|docs| {
				docs.iter()
					.filter(|doc| matches_filter(doc, &filter))
					.cloned()
					.collect()
			})
			.unwrap_or_default())
	}

	async fn insert_one(&self, collection: &str, mut document: Document) -> Result<String> {
		let id = match document.get("_id") {
			Some(id) => id.clone(),
			None => {
				let id = Bson::ObjectId(ObjectId::new());
				document.insert("_id", id.clone());
				id
			}
		};

		let mut collections = self.collections.write();
		let docs = collections.entry(collection.to_string()).or_default();
		if docs.iter().any(|doc| doc.get("_id") == Some(&id)) {
			return Err(NoSQLError::ExecutionError(format!(
				"duplicate key: _id {}",
				id
			)));
		}
		docs.push(document);

		Ok(match id {
			Bson::ObjectId(oid) => oid.to_hex(),
			Bson::String(s) => s,
			other => other.to_string(),
		})
	}

	async fn update_one(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
	) -> Result<UpdateResult> {
		let fields = set_fields(&update)?;
		if fields.contains_key("_id") {
			return Err(NoSQLError::InvalidOperation(
				"the _id field is immutable".to_string(),
			));
		}

		let mut collections = self.collections.write();
		let Some(document) = collections
			.get_mut(collection)
			.and_then(|docs| docs.iter_mut().find(|doc| matches_filter(doc, &filter)))
		else {
			return Ok(UpdateResult::new(0, 0));
		};

		let mut modified = false;
		for (key, value) in fields {
			if document.get(key) != Some(value) {
				document.insert(key.clone(), value.clone());
				modified = true;
			}
		}

		Ok(UpdateResult::new(1, u64::from(modified)))
	}

	async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64> {
		let mut collections = self.collections.write();
		let Some(docs) = collections.get_mut(collection) else {
			return Ok(0);
		};

		match docs.iter().position(|doc| matches_filter(doc, &filter)) {
			Some(index) => {
				docs.remove(index);
				Ok(1)
			}
			None => Ok(0),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bson::doc;
	use rstest::{fixture, rstest};

	#[fixture]
	fn backend() -> InMemoryBackend {
		InMemoryBackend::new()
	}

	#[rstest]
	#[tokio::test]
	async fn test_insert_assigns_object_id(backend: InMemoryBackend) {
		// Act
		let id = backend
			.insert_one("issues", doc! { "issue_title": "first" })
			.await
			.unwrap();

		// Assert
		let oid = ObjectId::parse_str(&id).unwrap();
		let stored = backend
			.find_one("issues", doc! { "_id": oid })
			.await
			.unwrap()
			.unwrap();
		assert_eq!(stored.get_str("issue_title").unwrap(), "first");
	}

	#[rstest]
	#[tokio::test]
	async fn test_insert_rejects_duplicate_id(backend: InMemoryBackend) {
		// Arrange
		let oid = ObjectId::new();
		backend
			.insert_one("issues", doc! { "_id": oid })
			.await
			.unwrap();

		// Act
		let result = backend.insert_one("issues", doc! { "_id": oid }).await;

		// Assert
		assert!(matches!(result, Err(NoSQLError::ExecutionError(_))));
		assert_eq!(backend.len("issues"), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_find_many_requires_every_filter_key(backend: InMemoryBackend) {
		// Arrange
		backend
			.insert_one("issues", doc! { "project": "a", "created_by": "joe" })
			.await
			.unwrap();
		backend
			.insert_one("issues", doc! { "project": "a", "created_by": "ann" })
			.await
			.unwrap();
		backend
			.insert_one("issues", doc! { "project": "b", "created_by": "joe" })
			.await
			.unwrap();

		// Act
		let found = backend
			.find_many("issues", doc! { "project": "a", "created_by": "joe" })
			.await
			.unwrap();

		// Assert
		assert_eq!(found.len(), 1);
		assert_eq!(found[0].get_str("project").unwrap(), "a");
		assert_eq!(found[0].get_str("created_by").unwrap(), "joe");
	}

	#[rstest]
	#[tokio::test]
	async fn test_find_many_filter_does_not_match_missing_field(backend: InMemoryBackend) {
		// Arrange
		backend
			.insert_one("issues", doc! { "project": "a" })
			.await
			.unwrap();

		// Act
		let found = backend
			.find_many("issues", doc! { "color": "red" })
			.await
			.unwrap();

		// Assert
		assert!(found.is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_find_many_keeps_insertion_order(backend: InMemoryBackend) {
		// Arrange
		for n in 0..5 {
			backend
				.insert_one("issues", doc! { "n": n })
				.await
				.unwrap();
		}

		// Act
		let found = backend.find_many("issues", doc! {}).await.unwrap();

		// Assert
		let ns: Vec<i32> = found.iter().map(|d| d.get_i32("n").unwrap()).collect();
		assert_eq!(ns, vec![0, 1, 2, 3, 4]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_find_many_unknown_collection_is_empty(backend: InMemoryBackend) {
		// Act
		let found = backend
			.find_many("nothing", doc! {})
			.await
			.unwrap();

		// Assert
		assert!(found.is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_update_one_sets_fields_on_first_match(backend: InMemoryBackend) {
		// Arrange
		backend
			.insert_one("issues", doc! { "project": "a", "open": true })
			.await
			.unwrap();

		// Act
		let result = backend
			.update_one(
				"issues",
				doc! { "project": "a" },
				doc! { "$set": { "open": false, "assigned_to": "joe" } },
			)
			.await
			.unwrap();

		// Assert
		assert_eq!(result, UpdateResult::new(1, 1));
		let stored = backend
			.find_one("issues", doc! { "project": "a" })
			.await
			.unwrap()
			.unwrap();
		assert!(!stored.get_bool("open").unwrap());
		assert_eq!(stored.get_str("assigned_to").unwrap(), "joe");
	}

	#[rstest]
	#[tokio::test]
	async fn test_update_one_with_identical_values_matches_without_modifying(
		backend: InMemoryBackend,
	) {
		// Arrange
		backend
			.insert_one("issues", doc! { "project": "a", "open": true })
			.await
			.unwrap();

		// Act
		let result = backend
			.update_one(
				"issues",
				doc! { "project": "a" },
				doc! { "$set": { "open": true } },
			)
			.await
			.unwrap();

		// Assert
		assert_eq!(result, UpdateResult::new(1, 0));
	}

	#[rstest]
	#[tokio::test]
	async fn test_update_one_without_match_reports_zero(backend: InMemoryBackend) {
		// Act
		let result = backend
			.update_one(
				"issues",
				doc! { "project": "missing" },
				doc! { "$set": { "open": false } },
			)
			.await
			.unwrap();

		// Assert
		assert_eq!(result, UpdateResult::new(0, 0));
	}

	#[rstest]
	#[case(doc! { "open": false })]
	#[case(doc! { "$inc": { "n": 1 } })]
	#[case(doc! { "$set": { "_id": 1 } })]
	#[tokio::test]
	async fn test_update_one_rejects_unsupported_updates(
		backend: InMemoryBackend,
		#[case] update: Document,
	) {
		// Act
		let result = backend.update_one("issues", doc! {}, update).await;

		// Assert
		assert!(matches!(result, Err(NoSQLError::InvalidOperation(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_delete_one_removes_single_document(backend: InMemoryBackend) {
		// Arrange
		backend
			.insert_one("issues", doc! { "project": "a" })
			.await
			.unwrap();
		backend
			.insert_one("issues", doc! { "project": "a" })
			.await
			.unwrap();

		// Act
		let first = backend
			.delete_one("issues", doc! { "project": "a" })
			.await
			.unwrap();
		let missing = backend
			.delete_one("issues", doc! { "project": "b" })
			.await
			.unwrap();

		// Assert
		assert_eq!(first, 1);
		assert_eq!(missing, 0);
		assert_eq!(backend.len("issues"), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_health_check_always_succeeds(backend: InMemoryBackend) {
		// Act & Assert
		assert!(backend.health_check().await.is_ok());
		assert_eq!(backend.backend_type(), NoSQLBackendType::InMemory);
	}
}
