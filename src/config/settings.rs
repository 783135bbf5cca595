//! Settings module
//!
//! Settings are assembled from several sources. Priority order (highest to lowest):
//! 1. Environment variables with the `ISSUE_TRACKER_` prefix (a `.env` file
//!    in the working directory is loaded into the environment first)
//! 2. The conventional `PORT` and `MONGO_URI` variables
//! 3. TOML settings file (`settings/base.toml` unless `ISSUE_TRACKER_SETTINGS`
//!    names another path; a missing file is skipped)
//! 4. Default values

use serde::Deserialize;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix for every environment variable read by the loader.
pub const ENV_PREFIX: &str = "ISSUE_TRACKER_";

/// Default location of the settings file, relative to the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "settings/base.toml";

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The settings file exists but could not be read
	#[error("Failed to read settings file {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// The settings file is not valid TOML for [`Settings`]
	#[error("Failed to parse settings file {path}: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// An environment variable holds a value of the wrong type
	#[error("Invalid value for {key}: {value:?}")]
	InvalidValue { key: String, value: String },

	/// Host and port do not form a usable socket address
	#[error("Invalid server address {0}")]
	InvalidAddress(String),
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
	pub host: String,
	pub port: u16,
	/// Grace period for in-flight connections after a shutdown signal
	pub shutdown_timeout_secs: u64,
	/// Largest request body accepted, in bytes
	pub max_body_bytes: usize,
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			port: 3000,
			shutdown_timeout_secs: 30,
			max_body_bytes: crate::server::DEFAULT_MAX_BODY_BYTES,
		}
	}
}

/// Document store settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
	/// `mongodb://...` connection string, or `memory://` for the in-memory store
	pub url: String,
	/// Database name on the MongoDB server
	pub name: String,
	/// Collection holding issue documents
	pub collection: String,
	pub max_pool_size: Option<u32>,
	pub min_pool_size: Option<u32>,
	/// Close pooled connections idle for longer than this
	pub max_idle_time_secs: Option<u64>,
}

impl Default for DatabaseSettings {
	fn default() -> Self {
		Self {
			url: "mongodb://localhost:27017".to_string(),
			name: "issue_tracker".to_string(),
			collection: "issues".to_string(),
			max_pool_size: None,
			min_pool_size: None,
			max_idle_time_secs: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
	/// `tracing-subscriber` filter directive used when `RUST_LOG` is unset
	pub level: String,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
		}
	}
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub server: ServerSettings,
	pub database: DatabaseSettings,
	pub logging: LoggingSettings,
}

impl Settings {
	/// Load settings from the process environment and the default settings file.
	pub fn load() -> Result<Self, ConfigError> {
		dotenv::dotenv().ok();
		SettingsLoader::new().load()
	}

	/// Resolve the configured host and port into a socket address.
	pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
		let addr = format!("{}:{}", self.server.host, self.server.port);
		addr.to_socket_addrs()
			.map_err(|_| ConfigError::InvalidAddress(addr.clone()))?
			.next()
			.ok_or(ConfigError::InvalidAddress(addr))
	}
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String>>;

/// Builds [`Settings`] from defaults, a TOML file and environment variables.
///
/// # Examples
///
/// ```
/// use issue_tracker::config::SettingsLoader;
///
/// let settings = SettingsLoader::new()
///     .with_env(|key| match key {
///         "ISSUE_TRACKER_PORT" => Some("8080".to_string()),
///         _ => None,
///     })
///     .without_file()
///     .load()
///     .unwrap();
///
/// assert_eq!(settings.server.port, 8080);
/// ```
pub struct SettingsLoader {
	file: Option<PathBuf>,
	env: EnvLookup,
}

impl Default for SettingsLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl SettingsLoader {
	/// Loader reading the real process environment.
	pub fn new() -> Self {
		Self {
			file: None,
			env: Box::new(|key| std::env::var(key).ok()),
		}
	}

	/// Replace the environment lookup.
	pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
		self.env = Box::new(lookup);
		self
	}

	/// Read settings from `path` instead of the default file.
	pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
		self.file = Some(path.into());
		self
	}

	/// Skip the settings file entirely.
	pub fn without_file(mut self) -> Self {
		self.file = Some(PathBuf::new());
		self
	}

	fn settings_file(&self) -> PathBuf {
		match &self.file {
			Some(path) => path.clone(),
			None => (self.env)(&format!("{}SETTINGS", ENV_PREFIX))
				.map(PathBuf::from)
				.unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE)),
		}
	}

	pub fn load(&self) -> Result<Settings, ConfigError> {
		let path = self.settings_file();
		let mut settings = if path.as_os_str().is_empty() {
			Settings::default()
		} else {
			read_file(&path)?
		};

		self.apply_env(&mut settings)?;
		Ok(settings)
	}

	fn var(&self, name: &str) -> Option<String> {
		(self.env)(&format!("{}{}", ENV_PREFIX, name))
	}

	fn apply_env(&self, settings: &mut Settings) -> Result<(), ConfigError> {
		if let Some(port) = (self.env)("PORT") {
			settings.server.port = parse_value("PORT", &port)?;
		}
		if let Some(url) = (self.env)("MONGO_URI") {
			settings.database.url = url;
		}

		if let Some(host) = self.var("HOST") {
			settings.server.host = host;
		}
		if let Some(port) = self.var("PORT") {
			settings.server.port = parse_value("ISSUE_TRACKER_PORT", &port)?;
		}
		if let Some(secs) = self.var("SHUTDOWN_TIMEOUT_SECS") {
			settings.server.shutdown_timeout_secs =
				parse_value("ISSUE_TRACKER_SHUTDOWN_TIMEOUT_SECS", &secs)?;
		}
		if let Some(bytes) = self.var("MAX_BODY_BYTES") {
			settings.server.max_body_bytes = parse_value("ISSUE_TRACKER_MAX_BODY_BYTES", &bytes)?;
		}
		if let Some(url) = self.var("DATABASE_URL") {
			settings.database.url = url;
		}
		if let Some(name) = self.var("DATABASE_NAME") {
			settings.database.name = name;
		}
		if let Some(collection) = self.var("DATABASE_COLLECTION") {
			settings.database.collection = collection;
		}
		if let Some(size) = self.var("DATABASE_MAX_POOL_SIZE") {
			settings.database.max_pool_size =
				Some(parse_value("ISSUE_TRACKER_DATABASE_MAX_POOL_SIZE", &size)?);
		}
		if let Some(size) = self.var("DATABASE_MIN_POOL_SIZE") {
			settings.database.min_pool_size =
				Some(parse_value("ISSUE_TRACKER_DATABASE_MIN_POOL_SIZE", &size)?);
		}
		if let Some(secs) = self.var("DATABASE_MAX_IDLE_TIME_SECS") {
			settings.database.max_idle_time_secs =
				Some(parse_value("ISSUE_TRACKER_DATABASE_MAX_IDLE_TIME_SECS", &secs)?);
		}
		if let Some(level) = self.var("LOG_LEVEL") {
			settings.logging.level = level;
		}

		Ok(())
	}
}

fn read_file(path: &Path) -> Result<Settings, ConfigError> {
	let content = match std::fs::read_to_string(path) {
		Ok(content) => content,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
			tracing::debug!(path = %path.display(), "settings file not found, using defaults");
			return Ok(Settings::default());
		}
		Err(source) => {
			return Err(ConfigError::Io {
				path: path.to_path_buf(),
				source,
			});
		}
	};

	toml::from_str(&content).map_err(|source| ConfigError::Parse {
		path: path.to_path_buf(),
		source,
	})
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
	value.trim().parse().map_err(|_| ConfigError::InvalidValue {
		key: key.to_string(),
		value: value.to_string(),
	})
}
