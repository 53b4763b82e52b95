// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Refresh scheduling configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Refresh configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct RefreshConfig {
	/// Minutes between fleet runs. Required; there is no safe default for
	/// how aggressively to hit the identity provider.
	pub interval_minutes: u64,
}

impl RefreshConfig {
	pub fn interval(&self) -> Duration {
		Duration::from_secs(self.interval_minutes * 60)
	}
}

/// Refresh configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshConfigLayer {
	#[serde(default)]
	pub interval_minutes: Option<u64>,
}

impl RefreshConfigLayer {
	pub fn merge(&mut self, other: RefreshConfigLayer) {
		if other.interval_minutes.is_some() {
			self.interval_minutes = other.interval_minutes;
		}
	}

	pub fn finalize(self) -> Result<RefreshConfig, ConfigError> {
		let interval_minutes =
			self.interval_minutes
				.ok_or_else(|| ConfigError::MissingValue {
					key: "refresh.interval_minutes".to_string(),
				})?;

		if interval_minutes == 0 {
			return Err(ConfigError::InvalidValue {
				key: "refresh.interval_minutes".to_string(),
				message: "must be greater than zero".to_string(),
			});
		}

		Ok(RefreshConfig { interval_minutes })
	}
}
