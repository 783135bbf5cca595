//! # Issue Tracker
//!
//! A project-scoped issue tracking REST API backed by a document store.
//!
//! The service exposes one resource, `/api/issues/{project}`:
//!
//! | Method | Effect |
//! |---|---|
//! | `POST` | create an issue in the project |
//! | `GET` | list the project's issues, filtered by query string or body fields |
//! | `PUT` | update fields of one issue identified by `_id` |
//! | `DELETE` | delete one issue identified by `_id` |
//!
//! Issues live in MongoDB in production. The in-memory backend selected by
//! the `memory://` database URL serves tests and local development.
//!
//! ## Quick Start
//!
//! ```rust
//! use issue_tracker::apps::issues::{IssueRepository, url_patterns};
//! use issue_tracker::http::{Handler, Request};
//! use issue_tracker::nosql::backends::memory::InMemoryBackend;
//! use hyper::Method;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let repository = IssueRepository::new(Arc::new(InMemoryBackend::new()));
//! let router = url_patterns(repository).unwrap();
//!
//! let request = Request::builder()
//!     .method(Method::POST)
//!     .uri("/api/issues/apitest")
//!     .header("content-type", "application/json")
//!     .body(r#"{"issue_title":"Title","issue_text":"Text","created_by":"Joe"}"#)
//!     .build()
//!     .unwrap();
//!
//! let response = router.handle(request).await.unwrap();
//! assert_eq!(response.status, hyper::StatusCode::OK);
//! # }
//! ```

pub mod apps;
pub mod config;
pub mod http;
pub mod logging;
pub mod nosql;
pub mod server;
pub mod urls;
