//! Issue document and the payloads that create, update and filter it.

use bson::oid::ObjectId;
use bson::{Bson, DateTime, Document, doc};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{IssueError, IssueResult};

/// Fields a client may change with an update.
pub const UPDATABLE_FIELDS: [&str; 6] = [
	"issue_title",
	"issue_text",
	"created_by",
	"assigned_to",
	"status_text",
	"open",
];

/// Text fields that must never be empty.
pub const REQUIRED_FIELDS: [&str; 3] = ["issue_title", "issue_text", "created_by"];

/// A stored issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
	#[serde(rename = "_id")]
	pub id: ObjectId,
	pub issue_title: String,
	pub issue_text: String,
	pub created_by: String,
	#[serde(default)]
	pub assigned_to: String,
	#[serde(default)]
	pub status_text: String,
	#[serde(default = "default_open")]
	pub open: bool,
	pub project: String,
	pub created_on: DateTime,
	pub updated_on: DateTime,
}

fn default_open() -> bool {
	true
}

impl Issue {
	/// Build a new issue in `project` stamped with `now`.
	pub fn create(project: &str, new: NewIssue, now: DateTime) -> Self {
		Self {
			id: ObjectId::new(),
			issue_title: new.issue_title,
			issue_text: new.issue_text,
			created_by: new.created_by,
			assigned_to: new.assigned_to,
			status_text: new.status_text,
			open: new.open,
			project: project.to_string(),
			created_on: now,
			updated_on: new.updated_on.unwrap_or(now),
		}
	}

	pub fn to_document(&self) -> IssueResult<Document> {
		bson::serialize_to_document(self).map_err(|e| IssueError::Corrupt(e.to_string()))
	}

	pub fn from_document(document: Document) -> IssueResult<Self> {
		bson::deserialize_from_document(document).map_err(|e| IssueError::Corrupt(e.to_string()))
	}
}

/// JSON shape of an issue returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueResponse {
	#[serde(rename = "_id")]
	pub id: String,
	pub issue_title: String,
	pub issue_text: String,
	pub created_by: String,
	pub assigned_to: String,
	pub status_text: String,
	pub open: bool,
	pub project: String,
	pub created_on: String,
	pub updated_on: String,
}

impl From<&Issue> for IssueResponse {
	fn from(issue: &Issue) -> Self {
		Self {
			id: issue.id.to_hex(),
			issue_title: issue.issue_title.clone(),
			issue_text: issue.issue_text.clone(),
			created_by: issue.created_by.clone(),
			assigned_to: issue.assigned_to.clone(),
			status_text: issue.status_text.clone(),
			open: issue.open,
			project: issue.project.clone(),
			created_on: format_timestamp(issue.created_on),
			updated_on: format_timestamp(issue.updated_on),
		}
	}
}

/// RFC 3339 in UTC with millisecond precision, e.g. `2023-09-14T12:00:00.000Z`.
pub fn format_timestamp(value: DateTime) -> String {
	chrono::DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis())
		.map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
		.unwrap_or_else(|| value.timestamp_millis().to_string())
}

/// Validated creation payload
#[derive(Debug, Clone, PartialEq)]
pub struct NewIssue {
	pub issue_title: String,
	pub issue_text: String,
	pub created_by: String,
	pub assigned_to: String,
	pub status_text: String,
	pub open: bool,
	pub updated_on: Option<DateTime>,
}

impl NewIssue {
	/// Validate the body of a create request.
	///
	/// `project`, `_id`, `created_on` and unknown keys are ignored. `null`
	/// counts as absent, and so does an empty `open` or `updated_on`.
	///
	/// # Examples
	///
	/// ```
	/// use issue_tracker::apps::issues::models::NewIssue;
	/// use serde_json::json;
	///
	/// let body = json!({
	///     "issue_title": "Fix error in posting data",
	///     "issue_text": "When we post data it has an error.",
	///     "created_by": "Joe",
	///     "open": "false",
	/// });
	/// let new = NewIssue::from_fields(body.as_object().unwrap()).unwrap();
	/// assert!(!new.open);
	/// assert_eq!(new.assigned_to, "");
	///
	/// let missing = json!({"issue_title": "Fix", "issue_text": "Text"});
	/// assert!(NewIssue::from_fields(missing.as_object().unwrap()).is_err());
	/// ```
	pub fn from_fields(fields: &Map<String, Value>) -> IssueResult<Self> {
		Ok(Self {
			issue_title: required_text(fields, "issue_title")?,
			issue_text: required_text(fields, "issue_text")?,
			created_by: required_text(fields, "created_by")?,
			assigned_to: optional_text(fields, "assigned_to")?.unwrap_or_default(),
			status_text: optional_text(fields, "status_text")?.unwrap_or_default(),
			open: match present(fields, "open", true) {
				Some(value) => coerce_bool(value).ok_or_else(|| invalid("open"))?,
				None => true,
			},
			updated_on: match present(fields, "updated_on", true) {
				Some(value) => Some(coerce_datetime(value).ok_or_else(|| invalid("updated_on"))?),
				None => None,
			},
		})
	}
}

/// Validated `$set` payload of an update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueUpdate {
	fields: Document,
}

impl IssueUpdate {
	/// Select and validate the updatable fields of an update body.
	///
	/// `_id`, non-updatable and unknown keys are dropped, as are `null`
	/// values and, for form bodies, empty strings. An empty result is not an
	/// error; check [`is_empty`](Self::is_empty).
	///
	/// # Errors
	///
	/// [`IssueError::Validation`] when a kept value has the wrong type or
	/// would blank a required field.
	pub fn from_fields(fields: &Map<String, Value>, form: bool) -> IssueResult<Self> {
		let kept: Vec<(&str, &Value)> = UPDATABLE_FIELDS
			.iter()
			.filter_map(|&key| present(fields, key, form).map(|value| (key, value)))
			.collect();

		let mut update = Document::new();
		for (key, value) in kept {
			let bson = if key == "open" {
				Bson::Boolean(coerce_bool(value).ok_or_else(|| invalid(key))?)
			} else {
				let text = coerce_text(value).ok_or_else(|| invalid(key))?;
				if text.is_empty() && REQUIRED_FIELDS.contains(&key) {
					return Err(IssueError::Validation(format!("{} cannot be empty", key)));
				}
				Bson::String(text)
			};
			update.insert(key, bson);
		}

		Ok(Self { fields: update })
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn fields(&self) -> &Document {
		&self.fields
	}

	/// The `$set` document applied to the store, stamping `updated_on`.
	pub fn into_set_document(self, now: DateTime) -> Document {
		let mut set = self.fields;
		set.insert("updated_on", now);
		doc! { "$set": set }
	}
}

/// Equality filter for listing issues
///
/// Conditions on `_id`, the issue attributes and the two timestamps are
/// supported. `null` and empty values are not conditions. A condition whose
/// value cannot be coerced makes the filter unmatchable rather than an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueFilter {
	conditions: Document,
	unmatchable: bool,
}

impl IssueFilter {
	pub fn from_fields(fields: &Map<String, Value>) -> Self {
		let mut filter = Self::default();

		for key in fields.keys() {
			let Some(value) = present(fields, key, true) else {
				continue;
			};
			let condition = match key.as_str() {
				"_id" => coerce_text(value)
					.and_then(|id| ObjectId::parse_str(id.trim()).ok())
					.map(Bson::ObjectId),
				"open" => coerce_bool(value).map(Bson::Boolean),
				"created_on" | "updated_on" => coerce_datetime(value).map(Bson::DateTime),
				"issue_title" | "issue_text" | "created_by" | "assigned_to" | "status_text" => {
					coerce_text(value).map(Bson::String)
				}
				_ => continue,
			};

			match condition {
				Some(bson) => {
					filter.conditions.insert(key.clone(), bson);
				}
				None => filter.unmatchable = true,
			}
		}

		filter
	}

	/// True when some condition can never match a stored issue.
	pub fn is_unmatchable(&self) -> bool {
		self.unmatchable
	}

	pub fn conditions(&self) -> &Document {
		&self.conditions
	}

	/// Store query for this filter scoped to `project`.
	pub fn to_query(&self, project: &str) -> Document {
		let mut query = self.conditions.clone();
		query.insert("project", project);
		query
	}
}

/// `Some(value)` when `key` was sent. `null` never counts; an empty string
/// counts only when `empty_is_absent` is false.
fn present<'a>(fields: &'a Map<String, Value>, key: &str, empty_is_absent: bool) -> Option<&'a Value> {
	match fields.get(key) {
		None | Some(Value::Null) => None,
		Some(Value::String(s)) if empty_is_absent && s.is_empty() => None,
		Some(value) => Some(value),
	}
}

fn invalid(key: &str) -> IssueError {
	IssueError::Validation(format!("invalid value for {}", key))
}

fn required_text(fields: &Map<String, Value>, key: &str) -> IssueResult<String> {
	fields
		.get(key)
		.and_then(coerce_text)
		.filter(|text| !text.is_empty())
		.ok_or_else(|| IssueError::Validation(format!("{} is required", key)))
}

fn optional_text(fields: &Map<String, Value>, key: &str) -> IssueResult<Option<String>> {
	match present(fields, key, false) {
		Some(value) => coerce_text(value).map(Some).ok_or_else(|| invalid(key)),
		None => Ok(None),
	}
}

/// Strings pass through; numbers and booleans become their string form.
pub fn coerce_text(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}

/// Booleans pass through; the strings `"true"` and `"false"` are parsed.
pub fn coerce_bool(value: &Value) -> Option<bool> {
	match value {
		Value::Bool(b) => Some(*b),
		Value::String(s) => match s.trim() {
			"true" => Some(true),
			"false" => Some(false),
			_ => None,
		},
		_ => None,
	}
}

/// RFC 3339 strings or integer milliseconds since the Unix epoch.
pub fn coerce_datetime(value: &Value) -> Option<DateTime> {
	match value {
		Value::String(s) => chrono::DateTime::parse_from_rfc3339(s.trim())
			.ok()
			.map(|dt| DateTime::from_millis(dt.timestamp_millis())),
		Value::Number(n) => n.as_i64().map(DateTime::from_millis),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use serde_json::json;

	fn fields(value: Value) -> Map<String, Value> {
		match value {
			Value::Object(map) => map,
			_ => panic!("expected object"),
		}
	}

	#[fixture]
	fn required() -> Value {
		json!({
			"issue_title": "Fix error in posting data",
			"issue_text": "When we post data it has an error.",
			"created_by": "Joe",
		})
	}

	#[rstest]
	fn test_new_issue_defaults(required: Value) {
		// Act
		let new = NewIssue::from_fields(&fields(required)).unwrap();

		// Assert
		assert_eq!(new.issue_title, "Fix error in posting data");
		assert_eq!(new.assigned_to, "");
		assert_eq!(new.status_text, "");
		assert!(new.open);
		assert_eq!(new.updated_on, None);
	}

	#[rstest]
	#[case("issue_title")]
	#[case("issue_text")]
	#[case("created_by")]
	fn test_new_issue_rejects_missing_or_blank_required(required: Value, #[case] key: &str) {
		// Arrange
		let mut missing = fields(required);
		let mut blank = missing.clone();
		let mut null = missing.clone();
		missing.remove(key);
		blank.insert(key.to_string(), json!(""));
		null.insert(key.to_string(), Value::Null);

		// Assert
		for body in [missing, blank, null] {
			assert!(matches!(
				NewIssue::from_fields(&body),
				Err(IssueError::Validation(_))
			));
		}
	}

	#[rstest]
	#[case(json!({"issue_title": {"nested": true}}))]
	#[case(json!({"assigned_to": ["a", "b"]}))]
	#[case(json!({"open": "maybe"}))]
	#[case(json!({"open": 1}))]
	#[case(json!({"updated_on": "yesterday"}))]
	fn test_new_issue_rejects_invalid_values(required: Value, #[case] overrides: Value) {
		// Arrange
		let mut body = fields(required);
		body.extend(fields(overrides));

		// Act
		let result = NewIssue::from_fields(&body);

		// Assert
		assert!(matches!(result, Err(IssueError::Validation(_))));
	}

	#[rstest]
	fn test_new_issue_coerces_scalars(required: Value) {
		// Arrange
		let mut body = fields(required);
		body.extend(fields(json!({
			"status_text": 42,
			"assigned_to": true,
			"open": "",
			"updated_on": 1694692800000i64,
		})));

		// Act
		let new = NewIssue::from_fields(&body).unwrap();

		// Assert
		assert_eq!(new.status_text, "42");
		assert_eq!(new.assigned_to, "true");
		assert!(new.open);
		assert_eq!(new.updated_on, Some(DateTime::from_millis(1_694_692_800_000)));
	}

	#[rstest]
	fn test_issue_create_forces_project_and_timestamps(required: Value) {
		// Arrange
		let new = NewIssue::from_fields(&fields(required)).unwrap();
		let now = DateTime::from_millis(1_694_692_800_000);

		// Act
		let issue = Issue::create("apitest", new, now);

		// Assert
		assert_eq!(issue.project, "apitest");
		assert_eq!(issue.created_on, now);
		assert_eq!(issue.updated_on, now);
	}

	#[rstest]
	fn test_issue_document_round_trip_keeps_bson_types(required: Value) {
		// Arrange
		let new = NewIssue::from_fields(&fields(required)).unwrap();
		let issue = Issue::create("apitest", new, DateTime::now());

		// Act
		let document = issue.to_document().unwrap();
		let decoded = Issue::from_document(document.clone()).unwrap();

		// Assert
		assert!(matches!(document.get("_id"), Some(Bson::ObjectId(_))));
		assert!(matches!(document.get("created_on"), Some(Bson::DateTime(_))));
		assert_eq!(decoded, issue);
	}

	#[rstest]
	fn test_issue_from_document_rejects_garbage() {
		let result = Issue::from_document(doc! { "_id": "not-an-oid", "issue_title": 1 });
		assert!(matches!(result, Err(IssueError::Corrupt(_))));
	}

	#[rstest]
	fn test_response_shape(required: Value) {
		// Arrange
		let new = NewIssue::from_fields(&fields(required)).unwrap();
		let issue = Issue::create("apitest", new, DateTime::from_millis(1_694_692_800_000));

		// Act
		let response = serde_json::to_value(IssueResponse::from(&issue)).unwrap();

		// Assert
		assert_eq!(response["_id"], json!(issue.id.to_hex()));
		assert_eq!(response["created_on"], json!("2023-09-14T12:00:00.000Z"));
		assert_eq!(response["open"], json!(true));
		assert_eq!(response["project"], json!("apitest"));
	}

	#[rstest]
	fn test_update_keeps_only_sent_updatable_fields() {
		// Arrange
		let body = fields(json!({
			"_id": "5f665eb46e296f6b9b6a504d",
			"issue_text": "New text",
			"assigned_to": "",
			"open": false,
			"status_text": null,
			"project": "other",
			"created_on": "2020-01-01T00:00:00Z",
			"unknown": "x",
		}));

		// Act
		let update = IssueUpdate::from_fields(&body, false).unwrap();

		// Assert
		assert_eq!(
			update.fields(),
			&doc! { "issue_text": "New text", "assigned_to": "", "open": false }
		);
	}

	#[rstest]
	fn test_update_form_empty_strings_are_not_sent() {
		// Arrange
		let body = fields(json!({
			"_id": "5f665eb46e296f6b9b6a504d",
			"issue_title": "",
			"issue_text": "",
			"created_by": "",
			"assigned_to": "",
			"status_text": "",
			"open": "",
		}));

		// Act
		let update = IssueUpdate::from_fields(&body, true).unwrap();

		// Assert
		assert!(update.is_empty());
	}

	#[rstest]
	#[case(json!({"issue_title": ""}))]
	#[case(json!({"open": "sometimes"}))]
	#[case(json!({"status_text": {"a": 1}}))]
	fn test_update_rejects_invalid_values(#[case] body: Value) {
		let result = IssueUpdate::from_fields(&fields(body), false);
		assert!(matches!(result, Err(IssueError::Validation(_))));
	}

	#[rstest]
	fn test_update_set_document_stamps_updated_on() {
		// Arrange
		let update = IssueUpdate::from_fields(&fields(json!({"open": "false"})), true).unwrap();
		let now = DateTime::from_millis(1_700_000_000_000);

		// Act
		let set = update.into_set_document(now);

		// Assert
		assert_eq!(set, doc! { "$set": { "open": false, "updated_on": now } });
	}

	#[rstest]
	fn test_filter_coerces_and_scopes_to_project() {
		// Arrange
		let body = fields(json!({
			"open": "false",
			"created_by": "Joe",
			"project": "other",
			"sort": "desc",
			"_id": "5f665eb46e296f6b9b6a504d",
		}));

		// Act
		let filter = IssueFilter::from_fields(&body);

		// Assert
		assert!(!filter.is_unmatchable());
		let query = filter.to_query("apitest");
		assert_eq!(query.get_bool("open").unwrap(), false);
		assert_eq!(query.get_str("created_by").unwrap(), "Joe");
		assert_eq!(query.get_str("project").unwrap(), "apitest");
		assert!(query.get("sort").is_none());
		assert_eq!(
			query.get_object_id("_id").unwrap().to_hex(),
			"5f665eb46e296f6b9b6a504d"
		);
	}

	#[rstest]
	fn test_filter_skips_blank_values() {
		// Arrange
		let body = fields(json!({
			"open": "",
			"assigned_to": "",
			"issue_title": "",
			"created_on": "",
			"_id": "",
			"status_text": null,
			"created_by": "Joe",
		}));

		// Act
		let filter = IssueFilter::from_fields(&body);

		// Assert
		assert!(!filter.is_unmatchable());
		assert_eq!(filter.conditions(), &doc! { "created_by": "Joe" });
	}

	#[rstest]
	#[case(json!({"_id": "not-an-id"}))]
	#[case(json!({"open": "perhaps"}))]
	#[case(json!({"updated_on": "last week"}))]
	fn test_filter_with_uncoercible_value_is_unmatchable(#[case] body: Value) {
		assert!(IssueFilter::from_fields(&fields(body)).is_unmatchable());
	}

	#[rstest]
	#[case(json!("2023-09-14T12:00:00.000Z"), Some(1_694_692_800_000))]
	#[case(json!("2023-09-14T14:00:00+02:00"), Some(1_694_692_800_000))]
	#[case(json!(1_694_692_800_000i64), Some(1_694_692_800_000))]
	#[case(json!(true), None)]
	#[case(json!("14/09/2023"), None)]
	fn test_coerce_datetime(#[case] value: Value, #[case] expected: Option<i64>) {
		assert_eq!(
			coerce_datetime(&value).map(|dt| dt.timestamp_millis()),
			expected
		);
	}
}
