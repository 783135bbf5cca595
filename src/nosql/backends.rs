//! Document store backend implementations
//!
//! - MongoDB (production)
//! - In-memory (tests, local development)

pub mod memory;
pub mod mongodb;
