use super::Request;
use hyper::Uri;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

impl Request {
	/// Parse query parameters from URI
	pub(super) fn parse_query_params(uri: &Uri) -> HashMap<String, String> {
		uri.query()
			.map(|q| {
				q.split('&')
					.filter(|pair| !pair.is_empty())
					.filter_map(|pair| {
						// Split on first '=' only to preserve '=' in values
						let mut parts = pair.splitn(2, '=');
						Some((
							parts.next()?.to_string(),
							parts.next().unwrap_or("").to_string(),
						))
					})
					.collect()
			})
			.unwrap_or_default()
	}

	/// Get the request path
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Get URL-decoded query parameters
	///
	/// Both `%XX` escapes and `+` (form encoding for a space) are decoded.
	///
	/// # Examples
	///
	/// ```
	/// use issue_tracker::http::Request;
	///
	/// let request = Request::builder()
	///     .uri("/api/issues/apitest?created_by=Joe%20Doe&status_text=In+QA")
	///     .build()
	///     .unwrap();
	///
	/// let decoded = request.decoded_query_params();
	/// assert_eq!(decoded.get("created_by"), Some(&"Joe Doe".to_string()));
	/// assert_eq!(decoded.get("status_text"), Some(&"In QA".to_string()));
	/// ```
	pub fn decoded_query_params(&self) -> HashMap<String, String> {
		self.query_params
			.iter()
			.map(|(k, v)| (decode_component(k), decode_component(v)))
			.collect()
	}

	/// Set a path parameter (used by the router for path variable extraction)
	pub fn set_path_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.path_params.insert(key.into(), value.into());
	}

	/// Get a path parameter captured by the router
	pub fn path_param(&self, key: &str) -> Option<&str> {
		self.path_params.get(key).map(String::as_str)
	}
}

fn decode_component(raw: &str) -> String {
	let spaced = raw.replace('+', " ");
	percent_decode_str(&spaced).decode_utf8_lossy().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_query_params_keep_equals_in_values() {
		// Arrange
		let request = Request::builder()
			.uri("/search?token=abc==&empty=&flag")
			.build()
			.unwrap();

		// Assert
		assert_eq!(request.query_params.get("token"), Some(&"abc==".to_string()));
		assert_eq!(request.query_params.get("empty"), Some(&String::new()));
		assert_eq!(request.query_params.get("flag"), Some(&String::new()));
	}

	#[rstest]
	fn test_no_query_string() {
		let request = Request::builder().uri("/api/issues/x").build().unwrap();
		assert!(request.query_params.is_empty());
		assert!(request.decoded_query_params().is_empty());
	}

	#[rstest]
	fn test_decoded_plus_literal_stays_plus_when_escaped() {
		// Arrange
		let request = Request::builder().uri("/x?q=a%2Bb").build().unwrap();

		// Act
		let decoded = request.decoded_query_params();

		// Assert
		assert_eq!(decoded.get("q"), Some(&"a+b".to_string()));
	}

	#[rstest]
	fn test_path_params() {
		// Arrange
		let mut request = Request::builder().uri("/api/issues/apitest").build().unwrap();

		// Act
		request.set_path_param("project", "apitest");

		// Assert
		assert_eq!(request.path_param("project"), Some("apitest"));
		assert_eq!(request.path_param("missing"), None);
	}
}
