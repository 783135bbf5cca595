//! URL routing.
//!
//! Patterns use `{name}` placeholders, each matching one non-empty path
//! segment. A single trailing slash on the request path is accepted whether
//! or not the pattern ends with one.

use async_trait::async_trait;
use hyper::StatusCode;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::sync::Arc;

use crate::http::{Handler, Request, Response, Result};

/// Maximum allowed length for a URL pattern string in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed size for a compiled pattern regex (in bytes).
const MAX_REGEX_SIZE: usize = 1 << 20;

/// A compiled path pattern such as `/api/issues/{project}`
#[derive(Debug, Clone)]
pub struct PathPattern {
	pattern: String,
	regex: regex::Regex,
	param_names: Vec<String>,
}

impl PathPattern {
	/// Compile a pattern.
	///
	/// # Errors
	///
	/// Returns an error if the pattern is too long, has an unterminated or
	/// empty placeholder, or does not compile.
	///
	/// # Examples
	///
	/// ```
	/// use issue_tracker::urls::PathPattern;
	///
	/// let pattern = PathPattern::new("/api/issues/{project}").unwrap();
	/// let params = pattern.matches("/api/issues/my%20app/").unwrap();
	/// assert_eq!(params.get("project"), Some(&"my app".to_string()));
	///
	/// assert!(pattern.matches("/api/issues/").is_none());
	/// assert!(pattern.matches("/api/issues/a/b").is_none());
	/// ```
	pub fn new(pattern: &str) -> std::result::Result<Self, String> {
		if pattern.len() > MAX_PATTERN_LENGTH {
			return Err(format!(
				"Pattern length {} exceeds maximum allowed length of {} bytes",
				pattern.len(),
				MAX_PATTERN_LENGTH
			));
		}

		let (regex_str, param_names) = Self::compile_pattern(pattern)?;

		let regex = regex::RegexBuilder::new(&regex_str)
			.size_limit(MAX_REGEX_SIZE)
			.build()
			.map_err(|e| format!("Failed to compile pattern regex: {}", e))?;

		Ok(Self {
			pattern: pattern.to_string(),
			regex,
			param_names,
		})
	}

	fn compile_pattern(pattern: &str) -> std::result::Result<(String, Vec<String>), String> {
		let mut regex_str = String::from("^");
		let mut param_names = Vec::new();
		let mut chars = pattern.trim_end_matches('/').chars();

		while let Some(c) = chars.next() {
			match c {
				'{' => {
					let mut param = String::new();
					let mut closed = false;
					for next in chars.by_ref() {
						if next == '}' {
							closed = true;
							break;
						}
						param.push(next);
					}

					if !closed {
						return Err(format!("Unterminated placeholder in pattern {}", pattern));
					}
					if param.is_empty() || !param.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
						return Err(format!("Invalid placeholder {{{}}} in pattern {}", param, pattern));
					}

					regex_str.push_str(&format!("(?P<{}>[^/]+)", param));
					param_names.push(param);
				}
				'/' | '.' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '^' | '$' | '|' | '\\' => {
					regex_str.push('\\');
					regex_str.push(c);
				}
				_ => regex_str.push(c),
			}
		}

		regex_str.push_str("/?$");
		Ok((regex_str, param_names))
	}

	/// Returns the original pattern string.
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// Returns the parameter names in pattern order.
	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Match `path`, returning the percent-decoded parameters.
	pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
		self.regex.captures(path).map(|caps| {
			self.param_names
				.iter()
				.filter_map(|name| {
					caps.name(name).map(|m| {
						let value = percent_decode_str(m.as_str()).decode_utf8_lossy();
						(name.clone(), value.to_string())
					})
				})
				.collect()
		})
	}
}

struct Route {
	pattern: PathPattern,
	handler: Arc<dyn Handler>,
}

/// Dispatches requests to the first route whose pattern matches the path
///
/// Unmatched paths are answered with `404 {"error": "not found"}`.
#[derive(Default)]
pub struct Router {
	routes: Vec<Route>,
}

impl Router {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register `handler` under `pattern`.
	pub fn route(
		mut self,
		pattern: &str,
		handler: Arc<dyn Handler>,
	) -> std::result::Result<Self, String> {
		self.routes.push(Route {
			pattern: PathPattern::new(pattern)?,
			handler,
		});
		Ok(self)
	}

	/// Registered patterns, in match order.
	pub fn patterns(&self) -> impl Iterator<Item = &str> {
		self.routes.iter().map(|route| route.pattern.pattern())
	}
}

#[async_trait]
impl Handler for Router {
	async fn handle(&self, mut request: Request) -> Result<Response> {
		for route in &self.routes {
			if let Some(params) = route.pattern.matches(request.path()) {
				for (key, value) in params {
					request.set_path_param(key, value);
				}
				return route.handler.handle(request).await;
			}
		}

		tracing::debug!(path = request.path(), "no route matched");
		Ok(Response::json_error(StatusCode::NOT_FOUND, "not found"))
	}
}
