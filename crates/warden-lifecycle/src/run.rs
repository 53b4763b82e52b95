// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One pass over the whole fleet of org records.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use warden_db::OrgStore;

use crate::error::RunError;
use crate::machine::OrgStateMachine;

/// Outcome counts for one fleet run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
	pub total: usize,
	pub succeeded: usize,
	pub failed: usize,
}

/// Executes fleet runs: loads every record, advances each through the state
/// machine, and writes each record back whether its stages succeeded or not.
///
/// A stage failure on one record never affects the others; only an
/// unavailable or empty store fails the run itself.
pub struct FleetRunner {
	store: Arc<dyn OrgStore>,
	machine: OrgStateMachine,
}

impl FleetRunner {
	pub fn new(store: Arc<dyn OrgStore>, machine: OrgStateMachine) -> Self {
		Self { store, machine }
	}

	/// Run every org record through the lifecycle once.
	#[instrument(skip(self))]
	pub async fn run_once(&self) -> Result<RunSummary, RunError> {
		let records = self.store.find_all().await?;
		if records.is_empty() {
			return Err(RunError::NoOrgsConfigured);
		}

		let mut summary = RunSummary {
			total: records.len(),
			..Default::default()
		};
		info!(total = summary.total, "starting fleet run");

		for mut record in records {
			match self.machine.advance(&mut record).await {
				Ok(()) => summary.succeeded += 1,
				Err(e) => {
					summary.failed += 1;
					if e.is_configuration() {
						warn!(
							record_id = %record.record_id,
							org = %record.display_name(),
							stage = e.stage(),
							error = %e,
							"record skipped, configuration incomplete"
						);
					} else {
						error!(
							record_id = %record.record_id,
							org = %record.display_name(),
							stage = e.stage(),
							error = %e,
							"record failed"
						);
					}
				}
			}

			// Persist whatever the machine reached, successful or not. A
			// write failure is logged and the run moves on; the record
			// simply re-runs from its last persisted state next time.
			if let Err(e) = self.store.upsert(&record).await {
				error!(
					record_id = %record.record_id,
					error = %e,
					"failed to persist record state"
				);
			}
		}

		info!(
			total = summary.total,
			succeeded = summary.succeeded,
			failed = summary.failed,
			"fleet run complete"
		);
		Ok(summary)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{bootstrap_record, machine_with, MemoryStore, MockProvider};
	use warden_core::FixedIdentityGenerator;

	fn runner(store: Arc<MemoryStore>, provider: Arc<MockProvider>) -> FleetRunner {
		let machine = machine_with(provider, FixedIdentityGenerator::new("machine-1", "pw"));
		FleetRunner::new(store, machine)
	}

	#[tokio::test]
	async fn test_empty_fleet_is_an_error() {
		let store = Arc::new(MemoryStore::default());
		let provider = Arc::new(MockProvider::default());

		let err = runner(Arc::clone(&store), provider).run_once().await.unwrap_err();
		assert!(matches!(err, RunError::NoOrgsConfigured));
		assert!(store.upsert_log().is_empty());
	}

	#[tokio::test]
	async fn test_store_failure_fails_the_run() {
		let store = Arc::new(MemoryStore::default());
		store.fail_find_all();
		let provider = Arc::new(MockProvider::default());

		let err = runner(store, provider).run_once().await.unwrap_err();
		assert!(matches!(err, RunError::Store(_)));
	}

	#[tokio::test]
	async fn test_all_records_processed_and_persisted() {
		let store = Arc::new(MemoryStore::with_records([
			bootstrap_record("a1"),
			bootstrap_record("a2"),
			bootstrap_record("a3"),
		]));
		let provider = Arc::new(MockProvider::default());

		let summary = runner(Arc::clone(&store), provider).run_once().await.unwrap();
		assert_eq!(
			summary,
			RunSummary {
				total: 3,
				succeeded: 3,
				failed: 0
			}
		);
		assert_eq!(store.upsert_log().len(), 3);
		for id in ["a1", "a2", "a3"] {
			assert!(store.get(id).unwrap().is_bootstrapped());
		}
	}

	#[tokio::test]
	async fn test_one_bad_record_does_not_stop_the_others() {
		let mut broken = bootstrap_record("a2");
		broken.password = None;
		let store = Arc::new(MemoryStore::with_records([
			bootstrap_record("a1"),
			broken,
			bootstrap_record("a3"),
		]));
		let provider = Arc::new(MockProvider::default());

		let summary = runner(Arc::clone(&store), provider).run_once().await.unwrap();
		assert_eq!(
			summary,
			RunSummary {
				total: 3,
				succeeded: 2,
				failed: 1
			}
		);
		assert!(store.get("a1").unwrap().is_bootstrapped());
		assert!(!store.get("a2").unwrap().is_bootstrapped());
		assert!(store.get("a3").unwrap().is_bootstrapped());
	}

	#[tokio::test]
	async fn test_failed_record_is_still_persisted_with_partial_state() {
		let store = Arc::new(MemoryStore::with_records([bootstrap_record("a1")]));
		let provider = Arc::new(MockProvider::default());
		provider.fail_bearer();

		let summary = runner(Arc::clone(&store), provider).run_once().await.unwrap();
		assert_eq!(summary.failed, 1);

		// Partial progress reached the store despite the stage failure.
		let persisted = store.get("a1").unwrap();
		assert!(persisted.admin_access_token.is_some());
		assert!(persisted.machine_account_id.is_some());
		assert!(persisted.machine_bearer.is_none());
	}

	#[tokio::test]
	async fn test_upsert_failure_does_not_stop_the_run() {
		let store = Arc::new(MemoryStore::with_records([
			bootstrap_record("a1"),
			bootstrap_record("a2"),
		]));
		store.fail_upsert_for("a1");
		let provider = Arc::new(MockProvider::default());

		let summary = runner(Arc::clone(&store), provider).run_once().await.unwrap();
		// Stage work succeeded for both; the failed write is only logged.
		assert_eq!(summary.succeeded, 2);
		assert_eq!(store.upsert_log().len(), 2);
		assert!(store.get("a2").unwrap().is_bootstrapped());
	}

	#[tokio::test]
	async fn test_second_run_resumes_from_persisted_state() {
		let store = Arc::new(MemoryStore::with_records([bootstrap_record("a1")]));
		let provider = Arc::new(MockProvider::default());
		provider.fail_bearer();

		let runner = runner(Arc::clone(&store), Arc::clone(&provider));
		runner.run_once().await.unwrap();

		// Provider recovers; next run finishes bootstrap without re-creating
		// the machine account.
		provider.clear_failures();
		provider.clear_call_log();
		let summary = runner.run_once().await.unwrap();

		assert_eq!(summary.succeeded, 1);
		assert!(store.get("a1").unwrap().is_bootstrapped());
		assert!(!provider.call_log().contains(&"create_account".to_string()));
	}
}
