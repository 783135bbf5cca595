//! Structured logging setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingSettings;

/// Build the filter: `RUST_LOG` wins, then the configured level, then `info`.
pub fn env_filter(settings: &LoggingSettings) -> EnvFilter {
	EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&settings.level))
		.unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global `tracing` subscriber.
///
/// Calling this more than once is harmless; later calls leave the first
/// subscriber in place.
pub fn init(settings: &LoggingSettings) {
	let result = tracing_subscriber::registry()
		.with(env_filter(settings))
		.with(fmt::layer().with_target(true))
		.try_init();

	if result.is_ok() {
		tracing::debug!(level = %settings.level, "logging initialized");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_init_twice_does_not_panic() {
		// Arrange
		let settings = LoggingSettings {
			level: "warn".to_string(),
		};

		// Act
		init(&settings);
		init(&settings);
	}

	#[rstest]
	fn test_invalid_level_falls_back() {
		// Arrange
		let settings = LoggingSettings {
			level: "[not a directive".to_string(),
		};

		// Act
		let filter = env_filter(&settings);

		// Assert
		assert!(!filter.to_string().is_empty());
	}
}
