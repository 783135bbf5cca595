mod body;
mod params;

pub use body::{BodyKind, Payload};

use bytes::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Uri, Version};
use std::collections::HashMap;
use std::net::SocketAddr;

use super::{Error, Result};

/// HTTP Request representation
///
/// The body is fully buffered by the server before the request reaches a
/// handler.
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	/// Parameters captured from the URL pattern, already percent-decoded
	pub path_params: HashMap<String, String>,
	/// Raw (still percent-encoded) query string parameters
	pub query_params: HashMap<String, String>,
	pub remote_addr: Option<SocketAddr>,
}

impl Request {
	/// Create a new request builder
	///
	/// # Examples
	///
	/// ```
	/// use issue_tracker::http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::POST)
	///     .uri("/api/issues/apitest?open=true")
	///     .header("content-type", "application/json")
	///     .body(r#"{"issue_title":"Title"}"#)
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.method, Method::POST);
	/// assert_eq!(request.path(), "/api/issues/apitest");
	/// assert_eq!(request.query_params.get("open"), Some(&"true".to_string()));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Assemble a request from its already-parsed parts.
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		let query_params = Self::parse_query_params(&uri);
		Self {
			method,
			uri,
			version,
			headers,
			body,
			path_params: HashMap::new(),
			query_params,
			remote_addr: None,
		}
	}

	/// Attach the peer address of the connection.
	pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
		self.remote_addr = Some(addr);
		self
	}

	/// Media type of the body without parameters, lowercased.
	pub fn content_type(&self) -> Option<String> {
		self.headers
			.get(CONTENT_TYPE)
			.and_then(|h| h.to_str().ok())
			.and_then(|v| v.split(';').next())
			.map(|v| v.trim().to_ascii_lowercase())
	}
}

/// Builder for [`Request`]
#[derive(Debug, Default)]
pub struct RequestBuilder {
	method: Method,
	uri: Option<String>,
	version: Version,
	headers: HeaderMap,
	body: Bytes,
	remote_addr: Option<SocketAddr>,
	invalid_header: Option<String>,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = version;
		self
	}

	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Add a single header; an invalid name or value fails [`build`](Self::build).
	pub fn header(mut self, name: &str, value: &str) -> Self {
		match (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			(Ok(name), Ok(value)) => {
				self.headers.insert(name, value);
			}
			_ => self.invalid_header = Some(name.to_string()),
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
		self.remote_addr = Some(addr);
		self
	}

	/// Build the request.
	///
	/// # Errors
	///
	/// Returns [`Error::ParseError`] when the URI is missing or malformed, or
	/// a header added with [`header`](Self::header) was invalid.
	pub fn build(self) -> Result<Request> {
		if let Some(name) = self.invalid_header {
			return Err(Error::ParseError(format!("invalid header: {}", name)));
		}

		let uri = self
			.uri
			.ok_or_else(|| Error::ParseError("missing uri".to_string()))?;
		let uri: Uri = uri
			.parse()
			.map_err(|e| Error::ParseError(format!("invalid uri {}: {}", uri, e)))?;

		let mut request = Request::new(self.method, uri, self.version, self.headers, self.body);
		request.remote_addr = self.remote_addr;
		Ok(request)
	}
}
