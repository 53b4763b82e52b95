// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lifecycle error taxonomy.
//!
//! A [`StageError`] ends processing of one record for the current run and
//! names the stage that failed; it never aborts the fleet run. A
//! [`RunError`] ends the whole run but never the process.

use thiserror::Error;
use warden_db::DbError;
use warden_provider::ProviderError;

/// Failure of one lifecycle stage for one record.
#[derive(Debug, Error)]
pub enum StageError {
	/// Operator must configure username and password on the record; not
	/// retried until the next run.
	#[error("record has no username/password configured")]
	MissingCredentials,

	/// Operator must configure connection data (or the identity triple) on
	/// the record.
	#[error("record has no connection data to derive credentials from")]
	MissingConnectionData,

	#[error("failed to resolve tenant identity: {0}")]
	IdentityResolutionFailed(#[source] ProviderError),

	#[error("admin authentication failed: {0}")]
	AdminAuthFailed(#[source] ProviderError),

	#[error("machine account creation failed: {0}")]
	MachineAccountCreateFailed(#[source] ProviderError),

	#[error("machine account authorization failed: {0}")]
	MachineAccountAuthorizeFailed(#[source] ProviderError),

	#[error("machine bearer token request failed: {0}")]
	MachineBearerFailed(#[source] ProviderError),

	#[error("access token request failed: {0}")]
	AccessTokenFailed(#[source] ProviderError),

	#[error("access token refresh failed: {0}")]
	AccessTokenRefreshFailed(#[source] ProviderError),

	#[error("admin token refresh failed: {0}")]
	AdminTokenRefreshFailed(#[source] ProviderError),
}

impl StageError {
	/// Stage name for log lines.
	pub fn stage(&self) -> &'static str {
		match self {
			StageError::MissingCredentials => "validate_credentials",
			StageError::MissingConnectionData | StageError::IdentityResolutionFailed(_) => {
				"resolve_identity"
			}
			StageError::AdminAuthFailed(_) => "admin_auth",
			StageError::MachineAccountCreateFailed(_) => "machine_account_create",
			StageError::MachineAccountAuthorizeFailed(_) => "machine_account_authorize",
			StageError::MachineBearerFailed(_) => "machine_bearer",
			StageError::AccessTokenFailed(_) => "access_token",
			StageError::AccessTokenRefreshFailed(_) => "access_token_refresh",
			StageError::AdminTokenRefreshFailed(_) => "admin_token_refresh",
		}
	}

	/// Whether the failure is an operator configuration problem rather than
	/// a provider interaction failure.
	pub fn is_configuration(&self) -> bool {
		matches!(
			self,
			StageError::MissingCredentials | StageError::MissingConnectionData
		)
	}
}

/// Failure of a whole fleet run.
#[derive(Debug, Error)]
pub enum RunError {
	#[error("no orgs configured; provision at least one record with connection data")]
	NoOrgsConfigured,

	#[error("store unavailable: {0}")]
	Store(#[from] DbError),
}
