// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML file, environment variables.

use std::path::PathBuf;

use tracing::debug;

use crate::error::ConfigError;
use crate::layer::WardenConfigLayer;
use crate::sections::{
	DatabaseConfigLayer, LoggingConfigLayer, ProviderConfigLayer, RefreshConfigLayer,
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
	fn load(&self) -> Result<WardenConfigLayer, ConfigError>;
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

	fn load(&self) -> Result<WardenConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(WardenConfigLayer::default())
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
		Self::new("/etc/warden/warden.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<WardenConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(WardenConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: WardenConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: WARDEN_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<WardenConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(WardenConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: env_var("WARDEN_DATABASE_URL"),
			}),
			provider: Some(ProviderConfigLayer {
				base_url: env_var("WARDEN_PROVIDER_BASE_URL"),
				timeout_secs: env_var_u64("WARDEN_PROVIDER_TIMEOUT_SECS")?,
				account_prefix: env_var("WARDEN_PROVIDER_ACCOUNT_PREFIX"),
			}),
			refresh: Some(RefreshConfigLayer {
				interval_minutes: env_var_u64("WARDEN_REFRESH_INTERVAL_MINUTES")?,
			}),
			logging: Some(LoggingConfigLayer {
				level: env_var("WARDEN_LOG_LEVEL"),
			}),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_var_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	env_var(name)
		.map(|raw| parse_u64(name, &raw))
		.transpose()
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, ConfigError> {
	raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
		key: key.to_string(),
		message: format!("expected a number, got {raw:?}"),
	})
}
