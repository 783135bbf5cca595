//! Base trait implemented by every document store backend.

use async_trait::async_trait;

use super::super::error::Result;
use super::super::types::NoSQLBackendType;

#[async_trait]
pub trait NoSQLBackend: Send + Sync {
	/// Which backend this is.
	fn backend_type(&self) -> NoSQLBackendType;

	/// Verify that the store is reachable.
	async fn health_check(&self) -> Result<()>;
}
