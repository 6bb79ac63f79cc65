// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AuditConfigLayer, DatabaseConfigLayer, IdentityConfigLayer, LoggingConfigLayer,
	QueueOverflowPolicy, SessionConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/garden/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: GARDEN_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			database: Some(load_database_from_env()?),
			session: Some(load_session_from_env()?),
			identity: Some(load_identity_from_env()?),
			audit: Some(load_audit_from_env()?),
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T: std::str::FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_database_from_env() -> Result<DatabaseConfigLayer, ConfigError> {
	Ok(DatabaseConfigLayer {
		url: env_var("GARDEN_SERVER_DATABASE_URL"),
		max_connections: env_parse("GARDEN_SERVER_DATABASE_MAX_CONNECTIONS", "u32")?,
	})
}

fn load_session_from_env() -> Result<SessionConfigLayer, ConfigError> {
	Ok(SessionConfigLayer {
		validity_days: env_parse("GARDEN_SERVER_SESSION_VALIDITY_DAYS", "i64")?,
		sweep_interval_secs: env_parse("GARDEN_SERVER_SESSION_SWEEP_INTERVAL_SECS", "u64")?,
	})
}

fn load_identity_from_env() -> Result<IdentityConfigLayer, ConfigError> {
	Ok(IdentityConfigLayer {
		request_timeout_ms: env_parse("GARDEN_SERVER_IDENTITY_REQUEST_TIMEOUT_MS", "u64")?,
	})
}

fn load_audit_from_env() -> Result<AuditConfigLayer, ConfigError> {
	let queue_overflow_policy = env_var("GARDEN_SERVER_AUDIT_QUEUE_OVERFLOW_POLICY").map(|v| {
		match v.to_lowercase().as_str() {
			"block" => QueueOverflowPolicy::Block,
			_ => QueueOverflowPolicy::DropNewest,
		}
	});

	Ok(AuditConfigLayer {
		enabled: env_bool("GARDEN_SERVER_AUDIT_ENABLED"),
		queue_capacity: env_parse("GARDEN_SERVER_AUDIT_QUEUE_CAPACITY", "usize")?,
		queue_overflow_policy,
		min_severity: env_var("GARDEN_SERVER_AUDIT_MIN_SEVERITY"),
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	Ok(LoggingConfigLayer {
		level: env_var("GARDEN_SERVER_LOG_LEVEL"),
		json: env_bool("GARDEN_SERVER_LOG_JSON"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.database.is_none());
		assert!(layer.session.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let source = TomlSource::new("/nonexistent/config.toml");
		let layer = source.load().unwrap();
		assert!(layer.database.is_none());
	}

	#[test]
	fn test_toml_source_reads_sections() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[database]
url = "sqlite:/tmp/garden-test.db"

[session]
validity_days = 14

[audit]
queue_overflow_policy = "block"
"#
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(
			layer.database.unwrap().url.as_deref(),
			Some("sqlite:/tmp/garden-test.db")
		);
		assert_eq!(layer.session.unwrap().validity_days, Some(14));
		assert_eq!(
			layer.audit.unwrap().queue_overflow_policy,
			Some(QueueOverflowPolicy::Block)
		);
	}

	#[test]
	fn test_toml_source_rejects_malformed_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[session\nvalidity_days = ").unwrap();

		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_env_parse_reports_key() {
		std::env::set_var("GARDEN_SERVER_TEST_ONLY_BAD_U64", "many");
		let err = env_parse::<u64>("GARDEN_SERVER_TEST_ONLY_BAD_U64", "u64").unwrap_err();
		std::env::remove_var("GARDEN_SERVER_TEST_ONLY_BAD_U64");

		match err {
			ConfigError::InvalidValue { key, .. } => {
				assert_eq!(key, "GARDEN_SERVER_TEST_ONLY_BAD_U64")
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn test_env_bool_accepts_true_and_one() {
		std::env::set_var("GARDEN_SERVER_TEST_ONLY_FLAG_A", "TRUE");
		std::env::set_var("GARDEN_SERVER_TEST_ONLY_FLAG_B", "1");
		std::env::set_var("GARDEN_SERVER_TEST_ONLY_FLAG_C", "no");
		assert_eq!(env_bool("GARDEN_SERVER_TEST_ONLY_FLAG_A"), Some(true));
		assert_eq!(env_bool("GARDEN_SERVER_TEST_ONLY_FLAG_B"), Some(true));
		assert_eq!(env_bool("GARDEN_SERVER_TEST_ONLY_FLAG_C"), Some(false));
		assert_eq!(env_bool("GARDEN_SERVER_TEST_ONLY_FLAG_UNSET"), None);
	}
}
