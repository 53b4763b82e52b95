// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory provider and store doubles shared by the lifecycle tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;

use warden_core::{MachineIdentityGenerator, OrgRecord, TokenBundle};
use warden_db::{DbError, OrgStore};
use warden_provider::{IdentityProvider, ProviderError};

use crate::machine::OrgStateMachine;

/// Scripted identity provider. Records every call, and can be told to fail
/// individual operations or to reject access-token requests with
/// `invalid_grant` a fixed number of times.
#[derive(Default)]
pub(crate) struct MockProvider {
	calls: Mutex<Vec<String>>,
	fail_admin: AtomicBool,
	fail_create: AtomicBool,
	fail_authorize: AtomicBool,
	fail_bearer: AtomicBool,
	fail_refresh: AtomicBool,
	invalid_grants: AtomicU32,
	token_counter: AtomicU64,
}

impl MockProvider {
	pub(crate) fn call_log(&self) -> Vec<String> {
		self.calls.lock().unwrap().clone()
	}

	pub(crate) fn clear_call_log(&self) {
		self.calls.lock().unwrap().clear();
	}

	pub(crate) fn fail_admin(&self) {
		self.fail_admin.store(true, Ordering::SeqCst);
	}

	pub(crate) fn fail_create(&self) {
		self.fail_create.store(true, Ordering::SeqCst);
	}

	pub(crate) fn fail_authorize(&self) {
		self.fail_authorize.store(true, Ordering::SeqCst);
	}

	pub(crate) fn fail_bearer(&self) {
		self.fail_bearer.store(true, Ordering::SeqCst);
	}

	pub(crate) fn fail_refresh(&self) {
		self.fail_refresh.store(true, Ordering::SeqCst);
	}

	/// Clear every scripted failure, simulating a recovered provider.
	pub(crate) fn clear_failures(&self) {
		self.fail_admin.store(false, Ordering::SeqCst);
		self.fail_create.store(false, Ordering::SeqCst);
		self.fail_authorize.store(false, Ordering::SeqCst);
		self.fail_bearer.store(false, Ordering::SeqCst);
		self.fail_refresh.store(false, Ordering::SeqCst);
		self.invalid_grants.store(0, Ordering::SeqCst);
	}

	/// Reject the next `count` access-token requests with `invalid_grant`.
	pub(crate) fn reject_access_token_with_invalid_grant(&self, count: u32) {
		self.invalid_grants.store(count, Ordering::SeqCst);
	}

	fn record_call(&self, name: &str) {
		self.calls.lock().unwrap().push(name.to_string());
	}

	fn next_bundle(&self, tag: &str) -> TokenBundle {
		let n = self.token_counter.fetch_add(1, Ordering::SeqCst);
		TokenBundle {
			access_token: format!("at-{tag}-{n}"),
			refresh_token: format!("rt-{tag}-{n}"),
			refresh_token_expires_in: 5184000,
		}
	}

	fn api_error(op: &str) -> ProviderError {
		ProviderError::Api {
			status: 500,
			message: format!("scripted {op} failure"),
		}
	}
}

#[async_trait]
impl IdentityProvider for MockProvider {
	async fn admin_access_token(
		&self,
		_username: &str,
		_password: &str,
		_org_id: &str,
		_client_id: &str,
		_client_secret: &str,
	) -> Result<TokenBundle, ProviderError> {
		self.record_call("admin_token");
		if self.fail_admin.load(Ordering::SeqCst) {
			return Err(Self::api_error("admin_token"));
		}
		Ok(self.next_bundle("admin"))
	}

	async fn create_machine_account(
		&self,
		_org_id: &str,
		_admin_bearer: &str,
		name: &str,
		_password: &str,
	) -> Result<String, ProviderError> {
		self.record_call("create_account");
		if self.fail_create.load(Ordering::SeqCst) {
			return Err(Self::api_error("create_account"));
		}
		Ok(format!("id-{name}"))
	}

	async fn authorize_machine_account(
		&self,
		_org_id: &str,
		_admin_bearer: &str,
		_machine_account_id: &str,
	) -> Result<(), ProviderError> {
		self.record_call("authorize_account");
		if self.fail_authorize.load(Ordering::SeqCst) {
			return Err(Self::api_error("authorize_account"));
		}
		Ok(())
	}

	async fn machine_bearer_token(
		&self,
		name: &str,
		_password: &str,
		_org_id: &str,
	) -> Result<String, ProviderError> {
		self.record_call("bearer_token");
		if self.fail_bearer.load(Ordering::SeqCst) {
			return Err(Self::api_error("bearer_token"));
		}
		let n = self.token_counter.fetch_add(1, Ordering::SeqCst);
		Ok(format!("bearer-{name}-{n}"))
	}

	async fn access_token(
		&self,
		_client_id: &str,
		_client_secret: &str,
		_bearer_token: &str,
	) -> Result<TokenBundle, ProviderError> {
		self.record_call("access_token");
		let remaining = self.invalid_grants.load(Ordering::SeqCst);
		if remaining > 0 {
			self.invalid_grants.store(remaining - 1, Ordering::SeqCst);
			return Err(ProviderError::InvalidGrant {
				status: 400,
				message: "invalid_grant: bearer token expired".to_string(),
			});
		}
		Ok(self.next_bundle("access"))
	}

	async fn refresh_access_token(
		&self,
		_client_id: &str,
		_client_secret: &str,
		_refresh_token: &str,
	) -> Result<TokenBundle, ProviderError> {
		self.record_call("refresh_token");
		if self.fail_refresh.load(Ordering::SeqCst) {
			return Err(Self::api_error("refresh_token"));
		}
		Ok(self.next_bundle("refreshed"))
	}
}

/// In-memory [`OrgStore`] tracking every upsert in arrival order.
#[derive(Default)]
pub(crate) struct MemoryStore {
	records: Mutex<BTreeMap<String, OrgRecord>>,
	upserts: Mutex<Vec<OrgRecord>>,
	fail_find_all: AtomicBool,
	panic_next_find_all: AtomicBool,
	fail_upsert_for: Mutex<Option<String>>,
	find_delay: Mutex<Option<std::time::Duration>>,
}

impl MemoryStore {
	pub(crate) fn with_records(records: impl IntoIterator<Item = OrgRecord>) -> Self {
		let store = Self::default();
		{
			let mut map = store.records.lock().unwrap();
			for record in records {
				map.insert(record.record_id.clone(), record);
			}
		}
		store
	}

	pub(crate) fn fail_find_all(&self) {
		self.fail_find_all.store(true, Ordering::SeqCst);
	}

	/// Panic inside the next `find_all` call only.
	pub(crate) fn panic_next_find_all(&self) {
		self.panic_next_find_all.store(true, Ordering::SeqCst);
	}

	pub(crate) fn insert(&self, record: OrgRecord) {
		self.records
			.lock()
			.unwrap()
			.insert(record.record_id.clone(), record);
	}

	/// Delay every `find_all` by the given duration, to simulate a slow
	/// store under paused-time tests.
	pub(crate) fn set_find_delay(&self, delay: std::time::Duration) {
		*self.find_delay.lock().unwrap() = Some(delay);
	}

	/// Fail every upsert for the record with the given id.
	pub(crate) fn fail_upsert_for(&self, record_id: &str) {
		*self.fail_upsert_for.lock().unwrap() = Some(record_id.to_string());
	}

	pub(crate) fn get(&self, record_id: &str) -> Option<OrgRecord> {
		self.records.lock().unwrap().get(record_id).cloned()
	}

	/// Every record handed to `upsert`, in call order, including rejected ones.
	pub(crate) fn upsert_log(&self) -> Vec<OrgRecord> {
		self.upserts.lock().unwrap().clone()
	}
}

#[async_trait]
impl OrgStore for MemoryStore {
	async fn find_all(&self) -> Result<Vec<OrgRecord>, DbError> {
		if self.panic_next_find_all.swap(false, Ordering::SeqCst) {
			panic!("scripted find_all panic");
		}
		if self.fail_find_all.load(Ordering::SeqCst) {
			return Err(DbError::Internal("scripted find_all failure".to_string()));
		}
		let delay = *self.find_delay.lock().unwrap();
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		Ok(self.records.lock().unwrap().values().cloned().collect())
	}

	async fn upsert(&self, record: &OrgRecord) -> Result<(), DbError> {
		self.upserts.lock().unwrap().push(record.clone());
		if self.fail_upsert_for.lock().unwrap().as_deref() == Some(record.record_id.as_str()) {
			return Err(DbError::Internal("scripted upsert failure".to_string()));
		}
		self.records
			.lock()
			.unwrap()
			.insert(record.record_id.clone(), record.clone());
		Ok(())
	}
}

/// Base64 connection-data blob with both environment blocks.
pub(crate) fn encode_blob() -> String {
	let body = json!({
		"org_id": "org-1",
		"production": { "client_id": "prod-id", "client_secret": "prod-secret" },
		"lab": { "client_id": "lab-id", "client_secret": "lab-secret" },
	});
	STANDARD.encode(serde_json::to_vec(&body).unwrap())
}

/// Fresh record holding only the operator-provisioned bootstrap fields.
pub(crate) fn bootstrap_record(record_id: &str) -> OrgRecord {
	let mut record = OrgRecord::new(record_id);
	record.username = Some(format!("admin-{record_id}@example.com"));
	record.password = Some("hunter2".to_string());
	record.connection_data_string = Some(encode_blob());
	record
}

pub(crate) fn machine_with(
	provider: Arc<MockProvider>,
	generator: impl MachineIdentityGenerator + 'static,
) -> OrgStateMachine {
	OrgStateMachine::new(provider, Arc::new(generator))
}
