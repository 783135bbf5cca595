//! Decoding of request bodies into a flat field map.

use serde_json::{Map, Value};

use super::Request;
use crate::http::{Error, Result};

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// How the body of a request was encoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyKind {
	#[default]
	Empty,
	Json,
	Form,
}

/// Top-level fields sent in a request body
///
/// Form values are always strings; JSON values keep their JSON type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
	kind: BodyKind,
	fields: Map<String, Value>,
}

impl Payload {
	pub fn new(kind: BodyKind, fields: Map<String, Value>) -> Self {
		Self { kind, fields }
	}

	pub fn kind(&self) -> BodyKind {
		self.kind
	}

	pub fn is_form(&self) -> bool {
		self.kind == BodyKind::Form
	}

	pub fn fields(&self) -> &Map<String, Value> {
		&self.fields
	}

	pub fn into_fields(self) -> Map<String, Value> {
		self.fields
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.fields.get(key)
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}
}

impl Request {
	/// Decode the body according to its `Content-Type`.
	///
	/// An empty body yields an empty payload. Form bodies become string
	/// fields (the last occurrence of a repeated key wins). JSON bodies must
	/// be objects. A body without a recognized content type is tried as JSON
	/// and otherwise treated as empty.
	///
	/// # Errors
	///
	/// Returns [`Error::ParseError`] for a declared JSON or form body that
	/// cannot be decoded, or a JSON body that is not an object.
	///
	/// # Examples
	///
	/// ```
	/// use issue_tracker::http::{BodyKind, Request};
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::PUT)
	///     .uri("/api/issues/apitest")
	///     .header("content-type", "application/x-www-form-urlencoded")
	///     .body("_id=5f665eb46e296f6b9b6a504d&open=false")
	///     .build()
	///     .unwrap();
	///
	/// let payload = request.payload().unwrap();
	/// assert_eq!(payload.kind(), BodyKind::Form);
	/// assert_eq!(payload.get("open").and_then(|v| v.as_str()), Some("false"));
	/// ```
	pub fn payload(&self) -> Result<Payload> {
		if self.body.iter().all(u8::is_ascii_whitespace) {
			return Ok(Payload::default());
		}

		match self.content_type().as_deref() {
			Some(FORM) => parse_form(&self.body),
			Some(JSON) => parse_json(&self.body),
			_ => Ok(parse_json(&self.body).unwrap_or_default()),
		}
	}
}

fn parse_form(body: &[u8]) -> Result<Payload> {
	let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
		.map_err(|e| Error::ParseError(format!("invalid form body: {}", e)))?;

	let fields = pairs
		.into_iter()
		.map(|(key, value)| (key, Value::String(value)))
		.collect();

	Ok(Payload::new(BodyKind::Form, fields))
}

fn parse_json(body: &[u8]) -> Result<Payload> {
	let value: Value = serde_json::from_slice(body)
		.map_err(|e| Error::ParseError(format!("invalid JSON body: {}", e)))?;

	match value {
		Value::Object(fields) => Ok(Payload::new(BodyKind::Json, fields)),
		other => Err(Error::ParseError(format!(
			"expected a JSON object, got {}",
			json_type_name(&other)
		))),
	}
}

fn json_type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
