//! Store access for issues.
//!
//! Every call into the document store goes through [`IssueRepository`], which
//! logs backend failures and turns them into [`IssueError::Store`].

use bson::oid::ObjectId;
use bson::{DateTime, Document, doc};
use std::sync::Arc;

use super::error::{IssueError, IssueResult};
use super::models::{Issue, IssueFilter, IssueUpdate, NewIssue};
use crate::nosql::{DocumentBackend, NoSQLError};

/// Collection holding issue documents.
pub const COLLECTION: &str = "issues";

/// Result of an update that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
	Updated,
	/// No issue with that id exists in the project
	NotMatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
	Deleted,
	NotFound,
}

#[derive(Clone)]
pub struct IssueRepository {
	backend: Arc<dyn DocumentBackend>,
	collection: String,
}

impl IssueRepository {
	pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
		Self {
			backend,
			collection: COLLECTION.to_string(),
		}
	}

	/// Store issues in `collection` instead of [`COLLECTION`].
	pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
		self.collection = collection.into();
		self
	}

	/// Persist a new issue in `project`.
	pub async fn create(&self, project: &str, new: NewIssue) -> IssueResult<Issue> {
		let issue = Issue::create(project, new, DateTime::now());
		let document = issue.to_document()?;

		self.backend
			.insert_one(&self.collection, document)
			.await
			.map_err(|e| store_error("insert", e))?;

		tracing::debug!(project, id = %issue.id, "issue created");
		Ok(issue)
	}

	/// All issues of `project` matching `filter`, in insertion order.
	pub async fn list(&self, project: &str, filter: &IssueFilter) -> IssueResult<Vec<Issue>> {
		if filter.is_unmatchable() {
			return Ok(Vec::new());
		}

		let documents = self
			.backend
			.find_many(&self.collection, filter.to_query(project))
			.await
			.map_err(|e| store_error("find", e))?;

		documents.into_iter().map(Issue::from_document).collect()
	}

	/// Fetch one issue of `project` by id.
	pub async fn get(&self, project: &str, id: &str) -> IssueResult<Option<Issue>> {
		let filter =
			scoped_id_filter(project, id).ok_or_else(|| IssueError::InvalidId(id.to_string()))?;

		self.backend
			.find_one(&self.collection, filter)
			.await
			.map_err(|e| store_error("find", e))?
			.map(Issue::from_document)
			.transpose()
	}

	/// Apply `update` to the issue `id` of `project`, stamping `updated_on`.
	pub async fn update(
		&self,
		project: &str,
		id: &str,
		update: IssueUpdate,
	) -> IssueResult<UpdateOutcome> {
		if update.is_empty() {
			return Err(IssueError::Validation("no update fields".to_string()));
		}
		let Some(filter) = scoped_id_filter(project, id) else {
			tracing::debug!(project, id, "update with malformed id");
			return Ok(UpdateOutcome::NotMatched);
		};

		let result = self
			.backend
			.update_one(&self.collection, filter, update.into_set_document(DateTime::now()))
			.await
			.map_err(|e| store_error("update", e))?;

		Ok(if result.matched_count == 1 {
			UpdateOutcome::Updated
		} else {
			UpdateOutcome::NotMatched
		})
	}

	/// Remove the issue `id` of `project`.
	pub async fn delete(&self, project: &str, id: &str) -> IssueResult<DeleteOutcome> {
		let Some(filter) = scoped_id_filter(project, id) else {
			tracing::debug!(project, id, "delete with malformed id");
			return Ok(DeleteOutcome::NotFound);
		};

		let deleted = self
			.backend
			.delete_one(&self.collection, filter)
			.await
			.map_err(|e| store_error("delete", e))?;

		Ok(if deleted == 1 {
			DeleteOutcome::Deleted
		} else {
			DeleteOutcome::NotFound
		})
	}
}

fn scoped_id_filter(project: &str, id: &str) -> Option<Document> {
	let oid = ObjectId::parse_str(id.trim()).ok()?;
	Some(doc! { "_id": oid, "project": project })
}

fn store_error(operation: &str, error: NoSQLError) -> IssueError {
	tracing::error!(operation, error = %error, "issue store operation failed");
	IssueError::Store(error)
}
