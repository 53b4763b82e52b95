// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decoded connection data shapes.
//!
//! The operator provisions each record with an opaque base64 blob handed out
//! by the identity provider. Decoded, it carries the org id and one
//! credential block per environment. Decoding itself lives in the provider
//! crate; the shapes live here so the record can cache the decoded value.

use serde::{Deserialize, Serialize};

/// Client credentials for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBlock {
	pub client_id: String,
	pub client_secret: String,
}

/// Decoded connection data blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionData {
	pub org_id: String,
	pub production: Option<CredentialBlock>,
	pub lab: Option<CredentialBlock>,
}

impl ConnectionData {
	/// Credential block for the requested environment, if present.
	pub fn block(&self, lab_mode: bool) -> Option<&CredentialBlock> {
		if lab_mode {
			self.lab.as_ref()
		} else {
			self.production.as_ref()
		}
	}
}

/// Tenant identity triple derived from connection data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedCredentials {
	pub org_id: String,
	pub client_id: String,
	pub client_secret: String,
}
