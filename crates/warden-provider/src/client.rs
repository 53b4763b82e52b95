// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP identity provider client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use warden_core::TokenBundle;

use crate::error::ProviderError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("warden/", env!("CARGO_PKG_VERSION"));

/// Identity provider operations consumed by the lifecycle state machine.
///
/// Each call is stateless; every failure carries the provider status where
/// one was received.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
	/// Authenticate the operator-provisioned admin identity.
	async fn admin_access_token(
		&self,
		username: &str,
		password: &str,
		org_id: &str,
		client_id: &str,
		client_secret: &str,
	) -> Result<TokenBundle, ProviderError>;

	/// Create a machine account; returns its provider-assigned id.
	async fn create_machine_account(
		&self,
		org_id: &str,
		admin_bearer: &str,
		name: &str,
		password: &str,
	) -> Result<String, ProviderError>;

	/// Authorize a previously created machine account.
	async fn authorize_machine_account(
		&self,
		org_id: &str,
		admin_bearer: &str,
		machine_account_id: &str,
	) -> Result<(), ProviderError>;

	/// Obtain a bearer token for a machine account.
	async fn machine_bearer_token(
		&self,
		name: &str,
		password: &str,
		org_id: &str,
	) -> Result<String, ProviderError>;

	/// Exchange a machine bearer for a tenant access token. Fails with
	/// [`ProviderError::InvalidGrant`] when the bearer has gone stale.
	async fn access_token(
		&self,
		client_id: &str,
		client_secret: &str,
		bearer_token: &str,
	) -> Result<TokenBundle, ProviderError>;

	/// Rotate a token bundle via its refresh token.
	async fn refresh_access_token(
		&self,
		client_id: &str,
		client_secret: &str,
		refresh_token: &str,
	) -> Result<TokenBundle, ProviderError>;
}

/// Reqwest-backed client for the identity provider API.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
	http_client: Client,
	base_url: String,
}

#[derive(Debug, Serialize)]
struct AdminTokenRequest<'a> {
	username: &'a str,
	password: &'a str,
	org_id: &'a str,
	client_id: &'a str,
	client_secret: &'a str,
}

#[derive(Debug, Serialize)]
struct MachineAccountRequest<'a> {
	name: &'a str,
	password: &'a str,
}

#[derive(Debug, Deserialize)]
struct MachineAccountResponse {
	id: String,
}

#[derive(Debug, Deserialize)]
struct BearerTokenResponse {
	bearer_token: String,
}

#[derive(Debug, Serialize)]
struct AccessTokenRequest<'a> {
	client_id: &'a str,
	client_secret: &'a str,
	bearer_token: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshTokenRequest<'a> {
	client_id: &'a str,
	client_secret: &'a str,
	refresh_token: &'a str,
}

/// Successful token response from the provider.
#[derive(Debug, Deserialize)]
struct TokenResponse {
	access_token: String,
	refresh_token: String,
	refresh_token_expires_in: i64,
}

impl From<TokenResponse> for TokenBundle {
	fn from(response: TokenResponse) -> Self {
		TokenBundle {
			access_token: response.access_token,
			refresh_token: response.refresh_token,
			refresh_token_expires_in: response.refresh_token_expires_in,
		}
	}
}

/// Error response body from the provider.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
	error: String,
	#[serde(default)]
	error_description: Option<String>,
}

impl HttpIdentityProvider {
	/// Create a client for the given API base URL with the default timeout.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self::with_timeout(base_url, DEFAULT_TIMEOUT)
	}

	/// Create a client with a custom request timeout.
	pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
		let http_client = Client::builder()
			.user_agent(USER_AGENT)
			.timeout(timeout)
			.build()
			.expect("failed to build HTTP client");

		Self {
			http_client,
			base_url: base_url.into().trim_end_matches('/').to_string(),
		}
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	async fn post_json<B, T>(
		&self,
		path: &str,
		bearer: Option<&str>,
		body: &B,
	) -> Result<T, ProviderError>
	where
		B: Serialize + Sync,
		T: DeserializeOwned,
	{
		let response = self.send(path, bearer, body).await?;
		response.json::<T>().await.map_err(|e| {
			error!(error = %e, "failed to parse provider response");
			ProviderError::InvalidResponse(format!("JSON parse error: {e}"))
		})
	}

	async fn post_no_content<B>(
		&self,
		path: &str,
		bearer: Option<&str>,
		body: &B,
	) -> Result<(), ProviderError>
	where
		B: Serialize + Sync,
	{
		self.send(path, bearer, body).await?;
		Ok(())
	}

	async fn send<B>(
		&self,
		path: &str,
		bearer: Option<&str>,
		body: &B,
	) -> Result<reqwest::Response, ProviderError>
	where
		B: Serialize + Sync,
	{
		let url = self.url(path);
		debug!(url = %url, "sending provider request");

		let mut request = self.http_client.post(&url).json(body);
		if let Some(token) = bearer {
			request = request.bearer_auth(token);
		}

		let response = request.send().await.map_err(|e| {
			if e.is_timeout() {
				error!(url = %url, "provider request timed out");
				return ProviderError::Timeout;
			}
			error!(url = %url, error = %e, "network error during provider request");
			ProviderError::Network(e)
		})?;

		let status = response.status();
		if status.is_success() {
			return Ok(response);
		}

		let status_code = status.as_u16();
		let body = response.text().await.unwrap_or_default();
		let (error_code, message) = match serde_json::from_str::<ApiErrorBody>(&body) {
			Ok(parsed) => {
				let message = parsed
					.error_description
					.unwrap_or_else(|| parsed.error.clone());
				(Some(parsed.error), message)
			}
			Err(_) => (None, body),
		};

		// A 400-class invalid_grant signals a stale bearer/refresh token and
		// gets its own variant so callers can react to it. Classification
		// keys on the machine-readable error code; the substring check
		// covers unstructured bodies.
		let invalid_grant = error_code.as_deref() == Some("invalid_grant")
			|| message.contains("invalid_grant");
		if (400..500).contains(&status_code) && invalid_grant {
			error!(url = %url, status = status_code, "provider rejected grant");
			return Err(ProviderError::InvalidGrant {
				status: status_code,
				message,
			});
		}

		error!(url = %url, status = status_code, message = %message, "provider API error");
		Err(ProviderError::Api {
			status: status_code,
			message,
		})
	}
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
	#[instrument(skip(self, password, client_secret), fields(username = %username, org_id = %org_id))]
	async fn admin_access_token(
		&self,
		username: &str,
		password: &str,
		org_id: &str,
		client_id: &str,
		client_secret: &str,
	) -> Result<TokenBundle, ProviderError> {
		let request = AdminTokenRequest {
			username,
			password,
			org_id,
			client_id,
			client_secret,
		};
		let response: TokenResponse = self.post_json("/v1/admin/token", None, &request).await?;
		Ok(response.into())
	}

	#[instrument(skip(self, admin_bearer, password), fields(org_id = %org_id, name = %name))]
	async fn create_machine_account(
		&self,
		org_id: &str,
		admin_bearer: &str,
		name: &str,
		password: &str,
	) -> Result<String, ProviderError> {
		let request = MachineAccountRequest { name, password };
		let response: MachineAccountResponse = self
			.post_json(
				&format!("/v1/orgs/{org_id}/machine-accounts"),
				Some(admin_bearer),
				&request,
			)
			.await?;
		Ok(response.id)
	}

	#[instrument(skip(self, admin_bearer), fields(org_id = %org_id, machine_account_id = %machine_account_id))]
	async fn authorize_machine_account(
		&self,
		org_id: &str,
		admin_bearer: &str,
		machine_account_id: &str,
	) -> Result<(), ProviderError> {
		self.post_no_content(
			&format!("/v1/orgs/{org_id}/machine-accounts/{machine_account_id}/authorize"),
			Some(admin_bearer),
			&serde_json::json!({}),
		)
		.await
	}

	#[instrument(skip(self, password), fields(org_id = %org_id, name = %name))]
	async fn machine_bearer_token(
		&self,
		name: &str,
		password: &str,
		org_id: &str,
	) -> Result<String, ProviderError> {
		let request = MachineAccountRequest { name, password };
		let response: BearerTokenResponse = self
			.post_json(
				&format!("/v1/orgs/{org_id}/machine-accounts/token"),
				None,
				&request,
			)
			.await?;
		Ok(response.bearer_token)
	}

	#[instrument(skip(self, client_secret, bearer_token), fields(client_id = %client_id))]
	async fn access_token(
		&self,
		client_id: &str,
		client_secret: &str,
		bearer_token: &str,
	) -> Result<TokenBundle, ProviderError> {
		let request = AccessTokenRequest {
			client_id,
			client_secret,
			bearer_token,
		};
		let response: TokenResponse = self.post_json("/v1/oauth2/token", None, &request).await?;
		Ok(response.into())
	}

	#[instrument(skip(self, client_secret, refresh_token), fields(client_id = %client_id))]
	async fn refresh_access_token(
		&self,
		client_id: &str,
		client_secret: &str,
		refresh_token: &str,
	) -> Result<TokenBundle, ProviderError> {
		let request = RefreshTokenRequest {
			client_id,
			client_secret,
			refresh_token,
		};
		let response: TokenResponse = self.post_json("/v1/oauth2/refresh", None, &request).await?;
		Ok(response.into())
	}
}
