// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Warden daemon.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`WARDEN_*`)
//!
//! # Usage
//!
//! ```ignore
//! use warden_config::load_config;
//!
//! let config = load_config()?;
//! println!("refreshing every {} minutes", config.refresh.interval_minutes);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::WardenConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::debug;

/// Fully resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct WardenConfig {
	pub database: DatabaseConfig,
	pub provider: ProviderConfig,
	pub refresh: RefreshConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WARDEN_*`)
/// 2. Config file (`/etc/warden/warden.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<WardenConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load and finalize configuration from an explicit list of sources.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<WardenConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = WardenConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	Ok(WardenConfig {
		database: merged.database.unwrap_or_default().finalize(),
		provider: merged.provider.unwrap_or_default().finalize()?,
		refresh: merged.refresh.unwrap_or_default().finalize()?,
		logging: merged.logging.unwrap_or_default().finalize(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_load_from_file_source_only() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
			[provider]
			base_url = "https://idp.example.com"

			[refresh]
			interval_minutes = 5
			"#
		)
		.unwrap();

		let config = load_from_sources(vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(file.path())),
		])
		.unwrap();

		assert_eq!(config.provider.base_url, "https://idp.example.com");
		assert_eq!(config.refresh.interval_minutes, 5);
		assert_eq!(config.database.url, "sqlite:./warden.db");
		assert_eq!(config.logging.level, "info");
	}

	#[test]
	fn test_missing_refresh_interval_is_startup_error() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
			[provider]
			base_url = "https://idp.example.com"
			"#
		)
		.unwrap();

		let err = load_from_sources(vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(file.path())),
		])
		.unwrap_err();

		assert!(matches!(err, ConfigError::MissingValue { ref key } if key.contains("interval")));
	}

	#[test]
	fn test_higher_precedence_source_wins() {
		let mut low = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			low,
			r#"
			[provider]
			base_url = "https://low.example.com"

			[refresh]
			interval_minutes = 60
			"#
		)
		.unwrap();

		// A second file source cannot outrank the first, so emulate the env
		// layer with a custom source at Environment precedence.
		struct OverrideSource;
		impl ConfigSource for OverrideSource {
			fn name(&self) -> &'static str {
				"override"
			}
			fn precedence(&self) -> Precedence {
				Precedence::Environment
			}
			fn load(&self) -> Result<WardenConfigLayer, ConfigError> {
				Ok(toml::from_str(
					r#"
					[refresh]
					interval_minutes = 5
					"#,
				)
				.unwrap())
			}
		}

		let config = load_from_sources(vec![
			Box::new(OverrideSource),
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(low.path())),
		])
		.unwrap();

		assert_eq!(config.provider.base_url, "https://low.example.com");
		assert_eq!(config.refresh.interval_minutes, 5);
	}
}
