// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity provider configuration.

use serde::Deserialize;

use crate::error::ConfigError;

/// Identity provider configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct ProviderConfig {
	/// Base URL of the identity provider API. Required.
	pub base_url: String,
	/// Per-request timeout in seconds.
	pub timeout_secs: u64,
	/// Prefix for generated machine-account names.
	pub account_prefix: String,
}

/// Identity provider configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfigLayer {
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub timeout_secs: Option<u64>,
	#[serde(default)]
	pub account_prefix: Option<String>,
}

impl ProviderConfigLayer {
	pub fn merge(&mut self, other: ProviderConfigLayer) {
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
		if other.account_prefix.is_some() {
			self.account_prefix = other.account_prefix;
		}
	}

	pub fn finalize(self) -> Result<ProviderConfig, ConfigError> {
		let base_url = self.base_url.ok_or_else(|| ConfigError::MissingValue {
			key: "provider.base_url".to_string(),
		})?;

		Ok(ProviderConfig {
			base_url,
			timeout_secs: self.timeout_secs.unwrap_or(30),
			account_prefix: self.account_prefix.unwrap_or_else(|| "warden".to_string()),
		})
	}
}
