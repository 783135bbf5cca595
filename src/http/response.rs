use bytes::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;

use super::{Error, Result};

/// HTTP Response representation
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use issue_tracker::http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	/// Create a Response with HTTP 200 OK status
	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	/// Create a Response with HTTP 404 Not Found status
	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	/// Create a Response with HTTP 405 Method Not Allowed and an `Allow` header
	///
	/// # Examples
	///
	/// ```
	/// use issue_tracker::http::Response;
	/// use hyper::{Method, StatusCode};
	///
	/// let response = Response::method_not_allowed(&[Method::GET, Method::POST]);
	/// assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
	/// assert_eq!(response.headers.get("allow").unwrap(), "GET, POST");
	/// ```
	pub fn method_not_allowed(allowed: &[hyper::Method]) -> Self {
		let allow = allowed
			.iter()
			.map(hyper::Method::as_str)
			.collect::<Vec<_>>()
			.join(", ");
		Self::new(StatusCode::METHOD_NOT_ALLOWED).with_header("allow", &allow)
	}

	/// Create a Response with HTTP 500 Internal Server Error status
	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// Set the response body
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Add a custom header to the response
	///
	/// Invalid names or values are ignored.
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let Ok(header_name) = HeaderName::from_bytes(name.as_bytes())
			&& let Ok(header_value) = HeaderValue::from_str(value)
		{
			self.headers.insert(header_name, header_value);
		}
		self
	}

	/// Set the response body to JSON and add appropriate Content-Type header
	///
	/// # Examples
	///
	/// ```
	/// use issue_tracker::http::Response;
	/// use serde_json::json;
	///
	/// let response = Response::ok()
	///     .with_json(&json!({"result": "successfully deleted"}))
	///     .unwrap();
	///
	/// assert_eq!(response.headers.get("content-type").unwrap(), "application/json");
	/// assert_eq!(&response.body[..], br#"{"result":"successfully deleted"}"#);
	/// ```
	pub fn with_json<T: Serialize + ?Sized>(mut self, data: &T) -> Result<Self> {
		let json = serde_json::to_vec(data).map_err(|e| Error::Serialization(e.to_string()))?;
		self.body = Bytes::from(json);
		self.headers
			.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		Ok(self)
	}

	/// JSON `{"error": message}` body with the given status.
	pub fn json_error(status: StatusCode, message: &str) -> Self {
		Self::new(status)
			.with_json(&serde_json::json!({ "error": message }))
			.unwrap_or_else(|_| Self::internal_server_error())
	}
}

impl From<Error> for Response {
	fn from(error: Error) -> Self {
		let status =
			StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		let message = if status.is_server_error() {
			"internal server error".to_string()
		} else {
			error.to_string()
		};

		Response::json_error(status, &message)
	}
}
