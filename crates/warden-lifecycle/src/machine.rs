// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-org credential lifecycle state machine.
//!
//! Each stage is gated on presence of the fields it produces, so a record
//! that already satisfies a stage skips it. That makes the machine naturally
//! resumable: a record partially advanced by a failed run picks up where it
//! left off, because the coordinator persists whatever state was reached.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use warden_core::{MachineIdentityGenerator, OrgRecord};
use warden_provider::{decode_connection_data, derive_credentials, IdentityProvider};

use crate::error::StageError;

/// Tenant identity threaded through the provider-facing stages.
struct Identity {
	org_id: String,
	client_id: String,
	client_secret: String,
}

/// Advances one [`OrgRecord`] to "tokens fresh" or fails with a
/// stage-tagged, non-fatal error. The record is mutated in place after each
/// successful stage, so partial progress is visible to the caller even on
/// failure.
pub struct OrgStateMachine {
	provider: Arc<dyn IdentityProvider>,
	generator: Arc<dyn MachineIdentityGenerator>,
}

impl OrgStateMachine {
	pub fn new(
		provider: Arc<dyn IdentityProvider>,
		generator: Arc<dyn MachineIdentityGenerator>,
	) -> Self {
		Self {
			provider,
			generator,
		}
	}

	/// Run all lifecycle stages for one record.
	#[instrument(skip(self, record), fields(record_id = %record.record_id, org = %record.display_name()))]
	pub async fn advance(&self, record: &mut OrgRecord) -> Result<(), StageError> {
		let (username, password) = match (&record.username, &record.password) {
			(Some(u), Some(p)) => (u.clone(), p.clone()),
			_ => return Err(StageError::MissingCredentials),
		};

		let identity = self.resolve_identity(record)?;
		self.ensure_admin_token(record, &username, &password, &identity).await?;

		if record.access_token.is_none() {
			self.bootstrap_access_token(record, &identity).await?;
		}

		self.refresh_access_token(record, &identity).await?;
		self.refresh_admin_token(record, &identity).await?;

		debug!("record tokens fresh");
		Ok(())
	}

	/// Stage 2: derive the org/client triple, decoding the connection data
	/// blob at most once and caching the result on the record.
	fn resolve_identity(&self, record: &mut OrgRecord) -> Result<Identity, StageError> {
		if !record.has_identity_triple() {
			if record.connection_data.is_none() {
				let raw = record
					.connection_data_string
					.as_deref()
					.ok_or(StageError::MissingConnectionData)?;
				let decoded = decode_connection_data(raw)
					.map_err(StageError::IdentityResolutionFailed)?;
				record.connection_data = Some(decoded);
			}

			let data = record
				.connection_data
				.as_ref()
				.ok_or(StageError::MissingConnectionData)?;
			let derived = derive_credentials(data, record.lab_mode)
				.map_err(StageError::IdentityResolutionFailed)?;

			// Populated fields are authoritative; only fill the gaps.
			record.org_id.get_or_insert(derived.org_id);
			record.client_id.get_or_insert(derived.client_id);
			record.client_secret.get_or_insert(derived.client_secret);
			info!("derived tenant identity from connection data");
		}

		match (&record.org_id, &record.client_id, &record.client_secret) {
			(Some(org_id), Some(client_id), Some(client_secret)) => Ok(Identity {
				org_id: org_id.clone(),
				client_id: client_id.clone(),
				client_secret: client_secret.clone(),
			}),
			_ => Err(StageError::MissingConnectionData),
		}
	}

	/// Stage 3: obtain the admin token once.
	async fn ensure_admin_token(
		&self,
		record: &mut OrgRecord,
		username: &str,
		password: &str,
		identity: &Identity,
	) -> Result<(), StageError> {
		if record.admin_access_token.is_some() {
			return Ok(());
		}

		info!("no admin access token, requesting one");
		let bundle = self
			.provider
			.admin_access_token(
				username,
				password,
				&identity.org_id,
				&identity.client_id,
				&identity.client_secret,
			)
			.await
			.map_err(StageError::AdminAuthFailed)?;

		record.admin_access_token = Some(bundle);
		Ok(())
	}

	/// Stages 4 and 5: first bootstrap of the tenant access token, with a
	/// single bearer-renewal retry when the provider reports a stale grant.
	async fn bootstrap_access_token(
		&self,
		record: &mut OrgRecord,
		identity: &Identity,
	) -> Result<(), StageError> {
		let mut renewed_bearer = false;
		loop {
			let bearer = self.ensure_machine_bearer(record, identity).await?;

			match self
				.provider
				.access_token(&identity.client_id, &identity.client_secret, &bearer)
				.await
			{
				Ok(bundle) => {
					info!("obtained tenant access token");
					record.access_token = Some(bundle);
					return Ok(());
				}
				Err(e) if e.is_invalid_grant() && !renewed_bearer => {
					// A stale bearer is the one expected transient failure.
					// Renew it exactly once; a second rejection surfaces.
					warn!("access token rejected with invalid_grant, renewing machine bearer");
					record.machine_bearer = None;
					renewed_bearer = true;
				}
				Err(e) => return Err(StageError::AccessTokenFailed(e)),
			}
		}
	}

	/// Stage 4: ensure a machine bearer, creating and authorizing the
	/// machine account first when the record has none.
	async fn ensure_machine_bearer(
		&self,
		record: &mut OrgRecord,
		identity: &Identity,
	) -> Result<String, StageError> {
		if let Some(bearer) = &record.machine_bearer {
			return Ok(bearer.clone());
		}

		if !record.has_machine_account() {
			// Name and password go on the record before the create call so a
			// failed attempt retries with the same identity on a later run.
			let name = self.generator.account_name();
			let password = self.generator.account_password();
			record.machine_account_name = Some(name.clone());
			record.machine_account_password = Some(password.clone());

			let admin_bearer = record
				.admin_access_token
				.as_ref()
				.map(|t| t.access_token.clone())
				.ok_or(StageError::MissingCredentials)?;

			info!(name = %name, "creating machine account");
			let account_id = self
				.provider
				.create_machine_account(&identity.org_id, &admin_bearer, &name, &password)
				.await
				.map_err(StageError::MachineAccountCreateFailed)?;
			record.machine_account_id = Some(account_id.clone());

			self.provider
				.authorize_machine_account(&identity.org_id, &admin_bearer, &account_id)
				.await
				.map_err(StageError::MachineAccountAuthorizeFailed)?;
			info!(machine_account_id = %account_id, "machine account authorized");
		}

		// Presence checked or populated above.
		let name = record.machine_account_name.clone().unwrap_or_default();
		let password = record.machine_account_password.clone().unwrap_or_default();

		let bearer = self
			.provider
			.machine_bearer_token(&name, &password, &identity.org_id)
			.await
			.map_err(StageError::MachineBearerFailed)?;

		info!("obtained machine bearer token");
		record.machine_bearer = Some(bearer.clone());
		Ok(bearer)
	}

	/// Stage 6: always refresh an existing access token, even one acquired
	/// moments ago. On failure the prior bundle stays in place.
	async fn refresh_access_token(
		&self,
		record: &mut OrgRecord,
		identity: &Identity,
	) -> Result<(), StageError> {
		let Some(current) = &record.access_token else {
			return Ok(());
		};

		let bundle = self
			.provider
			.refresh_access_token(
				&identity.client_id,
				&identity.client_secret,
				&current.refresh_token,
			)
			.await
			.map_err(StageError::AccessTokenRefreshFailed)?;

		debug!(
			expires_in = bundle.refresh_token_expires_in,
			"access token refreshed"
		);
		record.access_token = Some(bundle);
		Ok(())
	}

	/// Stage 7: symmetric refresh of the admin token.
	async fn refresh_admin_token(
		&self,
		record: &mut OrgRecord,
		identity: &Identity,
	) -> Result<(), StageError> {
		let Some(current) = &record.admin_access_token else {
			return Ok(());
		};

		let bundle = self
			.provider
			.refresh_access_token(
				&identity.client_id,
				&identity.client_secret,
				&current.refresh_token,
			)
			.await
			.map_err(StageError::AdminTokenRefreshFailed)?;

		debug!(
			expires_in = bundle.refresh_token_expires_in,
			"admin token refreshed"
		);
		record.admin_access_token = Some(bundle);
		Ok(())
	}
}
