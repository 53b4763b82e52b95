// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-org credential record and token bundle.
//!
//! An [`OrgRecord`] is one tenant's credential document. Records are created
//! out-of-band by an operator with at least the bootstrap credentials set;
//! the lifecycle machinery only enriches fields and writes the record back.
//! Every server-issued field is optional so a partially bootstrapped record
//! round-trips unchanged.

use serde::{Deserialize, Serialize};

use crate::connection::ConnectionData;

/// Access/refresh token pair as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
	pub access_token: String,
	pub refresh_token: String,
	/// Lifetime of the refresh token, in seconds.
	pub refresh_token_expires_in: i64,
}

/// One tenant's credential state.
///
/// `record_id` is the immutable store key. All other fields are populated
/// progressively by the lifecycle state machine; a field that is present is
/// treated as authoritative and is never re-derived unless an error-recovery
/// branch explicitly clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgRecord {
	pub record_id: String,

	/// Operator-provisioned admin credentials used for bootstrap.
	pub username: Option<String>,
	pub password: Option<String>,

	/// Tenant identity triple, derived once from the connection data.
	pub org_id: Option<String>,
	pub client_id: Option<String>,
	pub client_secret: Option<String>,

	/// Opaque encoded bootstrap blob and its lazily decoded cache.
	pub connection_data_string: Option<String>,
	pub connection_data: Option<ConnectionData>,

	/// Whether to derive credentials from the lab block of the connection
	/// data instead of the production block.
	#[serde(default)]
	pub lab_mode: bool,

	pub admin_access_token: Option<TokenBundle>,

	/// Provisioned service identity. Name and password are generated locally
	/// and survive a failed create/authorize attempt so a later run retries
	/// with the same identity instead of minting a new account.
	pub machine_account_name: Option<String>,
	pub machine_account_password: Option<String>,
	pub machine_account_id: Option<String>,

	pub machine_bearer: Option<String>,

	pub access_token: Option<TokenBundle>,
}

impl OrgRecord {
	/// Create an empty record with the given store key.
	pub fn new(record_id: impl Into<String>) -> Self {
		Self {
			record_id: record_id.into(),
			..Default::default()
		}
	}

	/// Bootstrap credentials present? Nothing can proceed without them.
	pub fn has_login_credentials(&self) -> bool {
		self.username.is_some() && self.password.is_some()
	}

	/// Tenant identity triple fully derived?
	pub fn has_identity_triple(&self) -> bool {
		self.org_id.is_some() && self.client_id.is_some() && self.client_secret.is_some()
	}

	/// Machine-account name and password already on the record?
	pub fn has_machine_account(&self) -> bool {
		self.machine_account_name.is_some() && self.machine_account_password.is_some()
	}

	/// A record with an access token has completed bootstrap and only needs
	/// the refresh path.
	pub fn is_bootstrapped(&self) -> bool {
		self.access_token.is_some()
	}

	/// Identifier used in log lines: username if configured, store key
	/// otherwise.
	pub fn display_name(&self) -> &str {
		self.username.as_deref().unwrap_or(&self.record_id)
	}
}
