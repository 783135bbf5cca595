//! HTTP/1.1 server built on hyper.
//!
//! ```rust,no_run
//! use issue_tracker::server::{HttpServer, ShutdownCoordinator, shutdown_signal};
//! use issue_tracker::urls::Router;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let coordinator = ShutdownCoordinator::new(Duration::from_secs(30));
//! let signal = coordinator.clone();
//! tokio::spawn(async move {
//!     shutdown_signal().await;
//!     signal.shutdown();
//! });
//!
//! HttpServer::new(Arc::new(Router::new()))
//!     .listen_with_shutdown("127.0.0.1:3000".parse()?, coordinator)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod http;
pub mod shutdown;

pub use http::{DEFAULT_MAX_BODY_BYTES, HttpServer, ServerResult};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
