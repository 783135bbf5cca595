use thiserror::Error;

/// Errors raised while decoding requests or encoding responses
#[derive(Debug, Error)]
pub enum Error {
	/// A response body could not be serialized
	#[error("Serialization error: {0}")]
	Serialization(String),

	/// The request line, a header or the body could not be parsed
	#[error("Parse error: {0}")]
	ParseError(String),

	/// The connection failed while the body was being read
	#[error("Failed to read request body: {0}")]
	BodyRead(String),

	/// The body is larger than the server accepts
	#[error("Request body exceeds {0} bytes")]
	PayloadTooLarge(usize),
}

impl Error {
	/// HTTP status code to answer with when this error escapes a handler.
	pub fn status_code(&self) -> u16 {
		match self {
			Error::Serialization(_) => 500,
			Error::ParseError(_) | Error::BodyRead(_) => 400,
			Error::PayloadTooLarge(_) => 413,
		}
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Serialization(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, Error>;
