// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Connection data decoding and credential derivation.
//!
//! The blob the operator puts on a record is base64-encoded JSON. Decoding
//! is pure and happens at most once per record; the decoded value is cached
//! on the record by the state machine.

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::trace;

use warden_core::{ConnectionData, DerivedCredentials};

use crate::error::ProviderError;

/// Decode an encoded connection-data blob.
pub fn decode_connection_data(raw: &str) -> Result<ConnectionData, ProviderError> {
	let bytes = STANDARD
		.decode(raw.trim())
		.map_err(|e| ProviderError::ConnectionData(format!("base64 decode failed: {e}")))?;

	let data: ConnectionData = serde_json::from_slice(&bytes)
		.map_err(|e| ProviderError::ConnectionData(format!("JSON parse failed: {e}")))?;

	trace!(org_id = %data.org_id, "decoded connection data");
	Ok(data)
}

/// Derive the tenant identity triple from decoded connection data.
///
/// `lab_mode` selects the lab credential block instead of production; a
/// missing block is an error rather than a silent fallback.
pub fn derive_credentials(
	data: &ConnectionData,
	lab_mode: bool,
) -> Result<DerivedCredentials, ProviderError> {
	let environment = if lab_mode { "lab" } else { "production" };
	let block = data.block(lab_mode).ok_or_else(|| {
		ProviderError::ConnectionData(format!("no {environment} credential block"))
	})?;

	Ok(DerivedCredentials {
		org_id: data.org_id.clone(),
		client_id: block.client_id.clone(),
		client_secret: block.client_secret.clone(),
	})
}
