// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the identity provider client.

use thiserror::Error;

/// Errors that can occur when interacting with the identity provider.
#[derive(Debug, Error)]
pub enum ProviderError {
	/// Network-level error during HTTP communication.
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	/// Request timed out.
	#[error("Request timed out")]
	Timeout,

	/// The provider rejected a grant: the bearer or refresh token in use is
	/// no longer valid.
	#[error("Invalid grant: {status} - {message}")]
	InvalidGrant { status: u16, message: String },

	/// The provider returned a non-success status.
	#[error("Provider API error: {status} - {message}")]
	Api { status: u16, message: String },

	/// Invalid or unparseable response body.
	#[error("Invalid response from provider: {0}")]
	InvalidResponse(String),

	/// Connection data blob could not be decoded or is missing the
	/// requested credential block.
	#[error("Invalid connection data: {0}")]
	ConnectionData(String),
}

impl ProviderError {
	/// Whether this is the distinguished stale-grant condition.
	pub fn is_invalid_grant(&self) -> bool {
		matches!(self, ProviderError::InvalidGrant { .. })
	}

	/// Provider HTTP status, when the provider answered at all.
	pub fn status(&self) -> Option<u16> {
		match self {
			ProviderError::InvalidGrant { status, .. } | ProviderError::Api { status, .. } => {
				Some(*status)
			}
			ProviderError::Network(e) => e.status().map(|s| s.as_u16()),
			_ => None,
		}
	}
}
