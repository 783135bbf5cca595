use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;

use super::shutdown::ShutdownCoordinator;
use crate::http::{Error, Handler, Request, Response};

pub type ServerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Request body limit used unless [`HttpServer::with_max_body_bytes`] sets another.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// HTTP/1.1 server dispatching every request to a single [`Handler`]
pub struct HttpServer {
	handler: Arc<dyn Handler>,
	max_body_bytes: usize,
}

impl HttpServer {
	/// Create a new server with the given handler
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			handler,
			max_body_bytes: DEFAULT_MAX_BODY_BYTES,
		}
	}

	/// Answer bodies larger than `max_body_bytes` with 413 instead of buffering them.
	pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
		self.max_body_bytes = max_body_bytes;
		self
	}

	/// Listen on `addr` until `coordinator` requests shutdown.
	pub async fn listen_with_shutdown(
		self,
		addr: SocketAddr,
		coordinator: ShutdownCoordinator,
	) -> ServerResult<()> {
		let listener = TcpListener::bind(addr).await?;
		self.serve(listener, coordinator).await
	}

	/// Accept connections from an already bound listener.
	///
	/// Once shutdown is requested the listener is dropped, open connections
	/// are asked to finish their current request and are given the
	/// coordinator's timeout before being aborted.
	pub async fn serve(
		self,
		listener: TcpListener,
		coordinator: ShutdownCoordinator,
	) -> ServerResult<()> {
		let local_addr = listener.local_addr()?;
		tracing::info!("Server listening on http://{}", local_addr);

		let mut connections = JoinSet::new();

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, socket_addr) = match result {
						Ok(accepted) => accepted,
						Err(e) => {
							tracing::warn!(error = %e, "failed to accept connection");
							continue;
						}
					};
					let service = RequestService {
						handler: self.handler.clone(),
						remote_addr: socket_addr,
						max_body_bytes: self.max_body_bytes,
					};
					let coordinator = coordinator.clone();

					connections.spawn(async move {
						if let Err(err) = Self::handle_connection(stream, service, coordinator).await
						{
							tracing::debug!(peer = %socket_addr, error = %err, "connection closed with error");
						}
					});
				}
				Some(_) = connections.join_next(), if !connections.is_empty() => {}
				_ = coordinator.shutdown_requested() => {
					tracing::info!("Shutdown signal received, stopping server...");
					break;
				}
			}
		}

		drop(listener);

		let drain = async { while connections.join_next().await.is_some() {} };
		if tokio::time::timeout(coordinator.timeout(), drain).await.is_err() {
			tracing::warn!(
				remaining = connections.len(),
				"grace period elapsed, aborting open connections"
			);
			connections.abort_all();
		}

		coordinator.notify_shutdown_complete();
		tracing::info!("Server stopped");

		Ok(())
	}

	/// Serve HTTP/1.1 on a single TCP connection
	async fn handle_connection(
		stream: TcpStream,
		service: RequestService,
		coordinator: ShutdownCoordinator,
	) -> ServerResult<()> {
		let io = TokioIo::new(stream);

		let conn = http1::Builder::new().serve_connection(io, service);
		tokio::pin!(conn);

		tokio::select! {
			result = conn.as_mut() => result?,
			_ = coordinator.shutdown_requested() => {
				conn.as_mut().graceful_shutdown();
				conn.await?;
			}
		}

		Ok(())
	}
}

/// Service implementation for hyper
struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
	max_body_bytes: usize,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;
		let max_body_bytes = self.max_body_bytes;

		Box::pin(async move {
			let started = Instant::now();
			let (parts, body) = req.into_parts();
			let method = parts.method.clone();
			let path = parts.uri.path().to_string();

			let declared_len = parts
				.headers
				.get(hyper::header::CONTENT_LENGTH)
				.and_then(|value| value.to_str().ok())
				.and_then(|value| value.parse::<usize>().ok());

			let body = match declared_len {
				Some(len) if len > max_body_bytes => Err(Error::PayloadTooLarge(max_body_bytes)),
				_ => Limited::new(body, max_body_bytes)
					.collect()
					.await
					.map(|collected| collected.to_bytes())
					.map_err(|e| {
						if e.downcast_ref::<LengthLimitError>().is_some() {
							Error::PayloadTooLarge(max_body_bytes)
						} else {
							Error::BodyRead(e.to_string())
						}
					}),
			};

			let response = match body {
				Ok(body) => {
					let request =
						Request::new(parts.method, parts.uri, parts.version, parts.headers, body)
							.with_remote_addr(remote_addr);

					handler.handle(request).await.unwrap_or_else(|err| {
						tracing::error!(%method, %path, error = %err, "handler failed");
						Response::from(err)
					})
				}
				Err(err) => {
					tracing::warn!(%method, %path, error = %err, "rejected request body");
					Response::from(err)
				}
			};

			tracing::info!(
				%method,
				%path,
				status = response.status.as_u16(),
				elapsed_ms = started.elapsed().as_millis() as u64,
				peer = %remote_addr,
				"request"
			);

			let mut hyper_response = hyper::Response::builder().status(response.status);
			for (key, value) in response.headers.iter() {
				hyper_response = hyper_response.header(key, value);
			}

			Ok(hyper_response.body(Full::new(response.body))?)
		})
	}
}
