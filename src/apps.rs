//! Installed applications.

pub mod issues;
