//! Graceful shutdown coordination.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Coordinates graceful shutdown between the signal handler, the accept loop
/// and every connection task.
///
/// Clones share state. Once [`shutdown`](Self::shutdown) has been called every
/// current and future call to [`shutdown_requested`](Self::shutdown_requested)
/// resolves immediately.
///
/// # Examples
///
/// ```
/// use issue_tracker::server::ShutdownCoordinator;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
/// assert!(!coordinator.is_shutting_down());
///
/// coordinator.shutdown();
/// coordinator.shutdown_requested().await;
/// assert!(coordinator.is_shutting_down());
/// # }
/// ```
#[derive(Clone)]
pub struct ShutdownCoordinator {
	requested: Arc<watch::Sender<bool>>,
	completed: Arc<watch::Sender<bool>>,
	timeout: Duration,
}

impl ShutdownCoordinator {
	/// Create a coordinator granting in-flight connections `timeout` to finish.
	pub fn new(timeout: Duration) -> Self {
		let (requested, _) = watch::channel(false);
		let (completed, _) = watch::channel(false);
		Self {
			requested: Arc::new(requested),
			completed: Arc::new(completed),
			timeout,
		}
	}

	/// Grace period for in-flight connections.
	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Request shutdown. Idempotent.
	pub fn shutdown(&self) {
		self.requested.send_replace(true);
	}

	pub fn is_shutting_down(&self) -> bool {
		*self.requested.borrow()
	}

	/// Resolves once shutdown has been requested.
	pub async fn shutdown_requested(&self) {
		let mut rx = self.requested.subscribe();
		// The sender lives in `self`, so the channel cannot close here.
		let _ = rx.wait_for(|requested| *requested).await;
	}

	/// Mark the server as fully stopped.
	pub fn notify_shutdown_complete(&self) {
		self.completed.send_replace(true);
	}

	/// Resolves once the server has drained its connections and stopped.
	pub async fn wait_for_shutdown(&self) {
		let mut rx = self.completed.subscribe();
		let _ = rx.wait_for(|completed| *completed).await;
	}
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "failed to listen for Ctrl-C");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		use tokio::signal::unix::{SignalKind, signal};
		match signal(SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			}
			Err(e) => {
				tracing::error!(error = %e, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => tracing::info!("received Ctrl-C"),
		_ = terminate => tracing::info!("received SIGTERM"),
	}
}
