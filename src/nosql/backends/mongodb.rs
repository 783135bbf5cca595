//! MongoDB connection and backend implementation
//!
//! # Example
//!
//! ```rust,no_run
//! use issue_tracker::nosql::backends::mongodb::MongoDBBackend;
//! use issue_tracker::nosql::DocumentBackend;
//! use bson::doc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = MongoDBBackend::connect("mongodb://localhost:27017")
//!     .await?
//!     .with_database("issue_tracker");
//!
//! let id = backend.insert_one("issues", doc! {
//!     "issue_title": "Fix error in posting data",
//!     "project": "apitest",
//! }).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bson::{Bson, Document};
use mongodb::{Client, Database};
use std::sync::Arc;

use crate::nosql::error::{NoSQLError, Result};
use crate::nosql::traits::{DocumentBackend, NoSQLBackend};
use crate::nosql::types::{NoSQLBackendType, UpdateResult};

/// MongoDB backend implementation
///
/// Cloning is cheap: clones share the driver's connection pool.
#[derive(Clone)]
pub struct MongoDBBackend {
	client: Arc<Client>,
	database_name: String,
}

/// Builder for configuring MongoDB connections
///
/// # Example
///
/// ```rust,no_run
/// use issue_tracker::nosql::backends::mongodb::MongoDBBackendBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MongoDBBackendBuilder::new()
///     .url("mongodb://localhost:27017")
///     .database("issue_tracker")
///     .max_pool_size(100)
///     .min_pool_size(10)
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct MongoDBBackendBuilder {
	url: String,
	database: String,
	max_pool_size: Option<u32>,
	min_pool_size: Option<u32>,
	max_idle_time_secs: Option<u64>,
}

impl Default for MongoDBBackendBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl MongoDBBackendBuilder {
	/// Create a new builder pointing at a local server and the `issue_tracker` database
	pub fn new() -> Self {
		Self {
			url: "mongodb://localhost:27017".to_string(),
			database: "issue_tracker".to_string(),
			max_pool_size: None,
			min_pool_size: None,
			max_idle_time_secs: None,
		}
	}

	/// Set the MongoDB connection URL
	pub fn url(mut self, url: impl Into<String>) -> Self {
		self.url = url.into();
		self
	}

	/// Set the database name
	pub fn database(mut self, database: impl Into<String>) -> Self {
		self.database = database.into();
		self
	}

	/// Set the maximum connection pool size
	pub fn max_pool_size(mut self, size: u32) -> Self {
		self.max_pool_size = Some(size);
		self
	}

	/// Set the minimum connection pool size
	pub fn min_pool_size(mut self, size: u32) -> Self {
		self.min_pool_size = Some(size);
		self
	}

	/// Set the maximum idle time for pooled connections in seconds
	pub fn max_idle_time_secs(mut self, secs: u64) -> Self {
		self.max_idle_time_secs = Some(secs);
		self
	}

	/// Build the MongoDB backend
	///
	/// The driver connects lazily, so this only fails on a malformed URL or
	/// invalid options. Use [`NoSQLBackend::health_check`] to verify the
	/// server is reachable.
	pub async fn build(self) -> Result<MongoDBBackend> {
		use mongodb::options::ClientOptions;
		use std::time::Duration;

		let mut options = ClientOptions::parse(&self.url)
			.await
			.map_err(|e| NoSQLError::ConfigError(format!("invalid MongoDB URL: {}", e)))?;

		if let Some(max_size) = self.max_pool_size {
			options.max_pool_size = Some(max_size);
		}

		if let Some(min_size) = self.min_pool_size {
			options.min_pool_size = Some(min_size);
		}

		if let Some(idle_time) = self.max_idle_time_secs {
			options.max_idle_time = Some(Duration::from_secs(idle_time));
		}

		let client = Client::with_options(options)?;

		Ok(MongoDBBackend {
			client: Arc::new(client),
			database_name: self.database,
		})
	}
}

impl MongoDBBackend {
	/// Connect to MongoDB using a connection string and the default database
	pub async fn connect(url: &str) -> Result<Self> {
		Self::builder().url(url).build().await
	}

	/// Create a builder for configuring the MongoDB connection
	pub fn builder() -> MongoDBBackendBuilder {
		MongoDBBackendBuilder::new()
	}

	/// Set the database name to use
	pub fn with_database(mut self, database_name: &str) -> Self {
		self.database_name = database_name.to_string();
		self
	}

	/// Name of the database this backend operates on
	pub fn database_name(&self) -> &str {
		&self.database_name
	}

	fn database(&self) -> Database {
		self.client.database(&self.database_name)
	}
}

fn bson_id_to_string(id: Bson) -> String {
	match id {
		Bson::ObjectId(oid) => oid.to_hex(),
		Bson::String(s) => s,
		other => other.to_string(),
	}
}

#[async_trait]
impl NoSQLBackend for MongoDBBackend {
	fn backend_type(&self) -> NoSQLBackendType {
		NoSQLBackendType::MongoDB
	}

	async fn health_check(&self) -> Result<()> {
		self.database()
			.run_command(bson::doc! { "ping": 1 })
			.await
			.map_err(|e| NoSQLError::ConnectionError(format!("Health check failed: {}", e)))?;
		Ok(())
	}
}

#[async_trait]
impl DocumentBackend for MongoDBBackend {
	async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>> {
		let coll = self.database().collection::<Document>(collection);

		coll.find_one(filter)
			.await
			.map_err(|e| NoSQLError::ExecutionError(e.to_string()))
	}

	async fn find_many(&self, collection: &str, filter: Document) -> Result<Vec<Document>> {
		use futures::stream::TryStreamExt;

		let coll = self.database().collection::<Document>(collection);

		tracing::debug!(collection, ?filter, "find_many");
		let cursor = coll
			.find(filter)
			.await
			.map_err(|e| NoSQLError::ExecutionError(e.to_string()))?;

		cursor
			.try_collect()
			.await
			.map_err(|e| NoSQLError::ExecutionError(e.to_string()))
	}

	async fn insert_one(&self, collection: &str, document: Document) -> Result<String> {
		let coll = self.database().collection::<Document>(collection);

		let result = coll
			.insert_one(document)
			.await
			.map_err(|e| NoSQLError::ExecutionError(e.to_string()))?;

		Ok(bson_id_to_string(result.inserted_id))
	}

	async fn update_one(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
	) -> Result<UpdateResult> {
		let coll = self.database().collection::<Document>(collection);

		tracing::debug!(collection, ?filter, "update_one");
		let result = coll
			.update_one(filter, update)
			.await
			.map_err(|e| NoSQLError::ExecutionError(e.to_string()))?;

		Ok(UpdateResult::new(result.matched_count, result.modified_count))
	}

	async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64> {
		let coll = self.database().collection::<Document>(collection);

		tracing::debug!(collection, ?filter, "delete_one");
		let result = coll
			.delete_one(filter)
			.await
			.map_err(|e| NoSQLError::ExecutionError(e.to_string()))?;

		Ok(result.deleted_count)
	}
}
