// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Garden identity server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`GARDEN_SERVER_*`)
//! - Tracing subscriber installation driven by the `logging` section
//!
//! # Usage
//!
//! ```ignore
//! use garden_server_config::{init_logging, load_config};
//!
//! let config = load_config()?;
//! init_logging(&config.logging)?;
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub database: DatabaseConfig,
	pub session: SessionConfig,
	pub identity: IdentityConfig,
	pub audit: AuditConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`GARDEN_SERVER_*`)
/// 2. Config file (`/etc/garden/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let database = layer.database.unwrap_or_default().finalize();
	let session = layer.session.unwrap_or_default().finalize();
	let identity = layer.identity.unwrap_or_default().finalize();
	let audit = layer.audit.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	let config = ServerConfig {
		database,
		session,
		identity,
		audit,
		logging,
	};
	validate_config(&config)?;

	info!(
		database = %config.database.url,
		session_validity_days = config.session.validity_days,
		audit_enabled = config.audit.enabled,
		"configuration loaded"
	);

	Ok(config)
}

fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.session.validity_days <= 0 {
		return Err(ConfigError::Validation(
			"session.validity_days must be positive".to_string(),
		));
	}
	if config.session.sweep_interval_secs == 0 {
		return Err(ConfigError::Validation(
			"session.sweep_interval_secs must be positive".to_string(),
		));
	}
	if config.audit.queue_capacity == 0 {
		return Err(ConfigError::Validation(
			"audit.queue_capacity must be positive".to_string(),
		));
	}
	if config.database.max_connections == 0 {
		return Err(ConfigError::Validation(
			"database.max_connections must be positive".to_string(),
		));
	}
	Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides `logging.level` when set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

	let registry = tracing_subscriber::registry().with(filter);
	let result = if config.json {
		registry
			.with(tracing_subscriber::fmt::layer().json())
			.try_init()
	} else {
		registry.with(tracing_subscriber::fmt::layer()).try_init()
	};

	result.map_err(|e| ConfigError::Logging(e.to_string()))
}
