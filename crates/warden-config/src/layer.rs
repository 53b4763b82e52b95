// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layer merged across sources.

use serde::Deserialize;

use crate::sections::{
	DatabaseConfigLayer, LoggingConfigLayer, ProviderConfigLayer, RefreshConfigLayer,
};

/// One source's worth of configuration, all fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WardenConfigLayer {
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub provider: Option<ProviderConfigLayer>,
	#[serde(default)]
	pub refresh: Option<RefreshConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl WardenConfigLayer {
	/// Merge a higher-precedence layer into this one.
	pub fn merge(&mut self, other: WardenConfigLayer) {
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.provider, other.provider, ProviderConfigLayer::merge);
		merge_section(&mut self.refresh, other.refresh, RefreshConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(base), Some(other)) => merge(base, other),
		(None, Some(other)) => *base = Some(other),
		_ => {}
	}
}
