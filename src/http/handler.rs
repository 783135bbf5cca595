//! The request handler abstraction.
//!
//! ```rust
//! use issue_tracker::http::{Handler, Request, Response, Result};
//! use async_trait::async_trait;
//!
//! struct Ping;
//!
//! #[async_trait]
//! impl Handler for Ping {
//!     async fn handle(&self, _request: Request) -> Result<Response> {
//!         Ok(Response::ok().with_body("pong"))
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use super::{Request, Response, Result};

/// Handler trait for processing requests.
///
/// Routers, views and the server all speak this trait. An `Err` escaping a
/// handler is turned into a JSON error response by the server.
#[async_trait]
pub trait Handler: Send + Sync {
	/// Handles an HTTP request and produces a response.
	async fn handle(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}
