//! Document store traits
//!
//! - `NoSQLBackend`: base trait for every backend
//! - `DocumentBackend`: document-oriented operations (MongoDB, in-memory)

mod base;
mod document;

pub use base::NoSQLBackend;
pub use document::DocumentBackend;
