//! Request handling for `/api/issues/{project}`.
//!
//! Every answer on this resource is `200 application/json`; failures are
//! reported through an `error` field in the body. The only exceptions are
//! unsupported methods (405) and response serialization failures (500).

use async_trait::async_trait;
use hyper::Method;
use serde::Serialize;
use serde_json::{Map, Value};

use super::models::{IssueFilter, IssueResponse, IssueUpdate, NewIssue, coerce_text};
use super::repository::{DeleteOutcome, IssueRepository, UpdateOutcome};
use crate::http::{Handler, Request, Response, Result};

pub const REQUIRED_FIELDS_MISSING: &str = "required field(s) missing";
pub const COULD_NOT_CREATE: &str = "could not create";
pub const COULD_NOT_RETRIEVE: &str = "could not retrieve issues";
pub const MISSING_ID: &str = "missing _id";
pub const NO_UPDATE_FIELDS: &str = "no update field(s) sent";
pub const COULD_NOT_UPDATE: &str = "could not update";
pub const COULD_NOT_DELETE: &str = "could not delete";
pub const SUCCESSFULLY_UPDATED: &str = "successfully updated";
pub const SUCCESSFULLY_DELETED: &str = "successfully deleted";

const ALLOWED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

/// Body of every non-list answer
#[derive(Debug, Serialize)]
struct Outcome<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	result: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<&'a str>,
	#[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
	id: Option<&'a str>,
}

impl<'a> Outcome<'a> {
	fn result(result: &'a str, id: &'a str) -> Self {
		Self {
			result: Some(result),
			error: None,
			id: Some(id),
		}
	}

	fn error(error: &'a str) -> Self {
		Self {
			result: None,
			error: Some(error),
			id: None,
		}
	}

	fn error_for(error: &'a str, id: &'a str) -> Self {
		Self {
			id: Some(id),
			..Self::error(error)
		}
	}
}

/// Handler for the issues resource, dispatching on the request method
#[derive(Clone)]
pub struct IssueHandler {
	repository: IssueRepository,
}

impl IssueHandler {
	pub fn new(repository: IssueRepository) -> Self {
		Self { repository }
	}

	async fn create(&self, project: &str, request: &Request) -> Result<Response> {
		let fields = match request.payload() {
			Ok(payload) => payload.into_fields(),
			Err(e) => {
				tracing::warn!(project, error = %e, "unreadable create body");
				return json(&Outcome::error(REQUIRED_FIELDS_MISSING));
			}
		};

		let new = match NewIssue::from_fields(&fields) {
			Ok(new) => new,
			Err(e) => {
				tracing::warn!(project, error = %e, "rejected issue");
				return json(&Outcome::error(REQUIRED_FIELDS_MISSING));
			}
		};

		match self.repository.create(project, new).await {
			Ok(issue) => json(&IssueResponse::from(&issue)),
			Err(_) => json(&Outcome::error(COULD_NOT_CREATE)),
		}
	}

	async fn list(&self, project: &str, request: &Request) -> Result<Response> {
		let mut fields: Map<String, Value> = request
			.decoded_query_params()
			.into_iter()
			.map(|(key, value)| (key, Value::String(value)))
			.collect();
		// An unreadable body filters nothing
		fields.extend(request.payload().unwrap_or_default().into_fields());

		let filter = IssueFilter::from_fields(&fields);
		match self.repository.list(project, &filter).await {
			Ok(issues) => {
				let issues: Vec<IssueResponse> = issues.iter().map(IssueResponse::from).collect();
				json(&issues)
			}
			Err(_) => json(&Outcome::error(COULD_NOT_RETRIEVE)),
		}
	}

	async fn update(&self, project: &str, request: &Request) -> Result<Response> {
		let Ok(payload) = request.payload() else {
			return json(&Outcome::error(MISSING_ID));
		};
		let Some(id) = id_of(payload.fields()) else {
			return json(&Outcome::error(MISSING_ID));
		};

		let update = match IssueUpdate::from_fields(payload.fields(), payload.is_form()) {
			Ok(update) if update.is_empty() => {
				return json(&Outcome::error_for(NO_UPDATE_FIELDS, &id));
			}
			Ok(update) => update,
			Err(e) => {
				tracing::warn!(project, id = %id, error = %e, "rejected update");
				return json(&Outcome::error_for(COULD_NOT_UPDATE, &id));
			}
		};

		match self.repository.update(project, &id, update).await {
			Ok(UpdateOutcome::Updated) => json(&Outcome::result(SUCCESSFULLY_UPDATED, &id)),
			Ok(UpdateOutcome::NotMatched) | Err(_) => json(&Outcome::error_for(COULD_NOT_UPDATE, &id)),
		}
	}

	async fn delete(&self, project: &str, request: &Request) -> Result<Response> {
		let id = request
			.payload()
			.ok()
			.and_then(|payload| id_of(payload.fields()));
		let Some(id) = id else {
			return json(&Outcome::error(MISSING_ID));
		};

		match self.repository.delete(project, &id).await {
			Ok(DeleteOutcome::Deleted) => json(&Outcome::result(SUCCESSFULLY_DELETED, &id)),
			Ok(DeleteOutcome::NotFound) | Err(_) => json(&Outcome::error_for(COULD_NOT_DELETE, &id)),
		}
	}
}

#[async_trait]
impl Handler for IssueHandler {
	async fn handle(&self, request: Request) -> Result<Response> {
		let project = request.path_param("project").unwrap_or_default().to_string();

		match request.method {
			Method::POST => self.create(&project, &request).await,
			Method::GET => self.list(&project, &request).await,
			Method::PUT => self.update(&project, &request).await,
			Method::DELETE => self.delete(&project, &request).await,
			ref other => {
				tracing::warn!(method = %other, project = %project, "method not allowed");
				Ok(Response::method_not_allowed(&ALLOWED_METHODS)
					.with_json(&Outcome::error("method not allowed"))?)
			}
		}
	}
}

/// Non-empty `_id` of a write request, echoed back verbatim.
fn id_of(fields: &Map<String, Value>) -> Option<String> {
	fields
		.get("_id")
		.and_then(coerce_text)
		.filter(|id| !id.is_empty())
}

fn json<T: Serialize + ?Sized>(body: &T) -> Result<Response> {
	Response::ok().with_json(body)
}
