//! HTTP request and response types shared by the router, the server and the
//! issue views.

pub mod error;
pub mod handler;
pub mod request;
pub mod response;

pub use error::{Error, Result};
pub use handler::Handler;
pub use request::{BodyKind, Payload, Request, RequestBuilder};
pub use response::Response;
