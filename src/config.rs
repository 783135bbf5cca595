//! Configuration for the issue tracker service.

pub mod settings;

pub use settings::{
	ConfigError, DatabaseSettings, LoggingSettings, ServerSettings, Settings, SettingsLoader,
};
