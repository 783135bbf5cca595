//! Document store layer
//!
//! The issue API only needs four operations from its store: insert, find by
//! filter, update one by filter and delete one by filter. This module defines
//! that contract as the [`DocumentBackend`](traits::DocumentBackend) trait and
//! provides two implementations:
//!
//! - [`MongoDBBackend`](backends::mongodb::MongoDBBackend) for production
//! - [`InMemoryBackend`](backends::memory::InMemoryBackend) for tests and
//!   local development
//!
//! Filters and updates are expressed as BSON documents in MongoDB syntax, so
//! both backends accept the same queries.

pub mod backends;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{NoSQLError, Result};
pub use traits::{DocumentBackend, NoSQLBackend};
pub use types::{NoSQLBackendType, UpdateResult};

use std::sync::Arc;

use crate::config::DatabaseSettings;
use backends::memory::InMemoryBackend;
use backends::mongodb::MongoDBBackend;

/// URL scheme that selects the in-memory backend.
pub const MEMORY_URL: &str = "memory://";

/// Create the backend described by the database settings.
///
/// A URL of `memory://` yields an [`InMemoryBackend`]; anything else is
/// handed to the MongoDB driver.
pub async fn connect(settings: &DatabaseSettings) -> Result<Arc<dyn DocumentBackend>> {
	if settings.url.starts_with(MEMORY_URL) {
		tracing::info!("using in-memory document store");
		return Ok(Arc::new(InMemoryBackend::new()));
	}

	let mut builder = MongoDBBackend::builder()
		.url(&settings.url)
		.database(&settings.name);
	if let Some(size) = settings.max_pool_size {
		builder = builder.max_pool_size(size);
	}
	if let Some(size) = settings.min_pool_size {
		builder = builder.min_pool_size(size);
	}
	if let Some(secs) = settings.max_idle_time_secs {
		builder = builder.max_idle_time_secs(secs);
	}

	let backend = builder.build().await?;
	tracing::info!(database = %settings.name, "connected to MongoDB");
	Ok(Arc::new(backend))
}
