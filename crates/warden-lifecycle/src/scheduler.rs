// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Periodic fleet-run scheduling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::run::FleetRunner;

/// Releases the in-flight flag when the run task ends, panicked or not, so
/// one bad run can never wedge the scheduler into skipping every tick.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
	fn drop(&mut self) {
		self.0.store(false, Ordering::SeqCst);
	}
}

/// Drives [`FleetRunner::run_once`] on a fixed interval.
///
/// The first run fires immediately on start. A tick that arrives while a run
/// is still in flight is skipped rather than queued, so runs never overlap
/// and a slow provider cannot build a backlog. Shutdown waits for any
/// in-flight run to finish before returning.
pub struct RefreshScheduler {
	runner: Arc<FleetRunner>,
	interval: Duration,
	running: Arc<AtomicBool>,
	shutdown_tx: broadcast::Sender<()>,
	handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
	pub fn new(runner: Arc<FleetRunner>, interval: Duration) -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			runner,
			interval,
			running: Arc::new(AtomicBool::new(false)),
			shutdown_tx,
			handle: Mutex::new(None),
		}
	}

	/// Whether a fleet run is currently in flight.
	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::SeqCst)
	}

	/// Spawn the scheduling loop. Idempotent start is not supported; call
	/// once per scheduler.
	#[instrument(skip(self), fields(interval_secs = self.interval.as_secs()))]
	pub async fn start(&self) {
		let runner = Arc::clone(&self.runner);
		let running = Arc::clone(&self.running);
		let mut shutdown_rx = self.shutdown_tx.subscribe();
		let mut ticker = tokio::time::interval(self.interval);
		ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

		let handle = tokio::spawn(async move {
			let mut current_run: Option<JoinHandle<()>> = None;
			loop {
				tokio::select! {
					_ = ticker.tick() => {
						// The flag is released by the run task itself, so a
						// failed exchange means the previous run is still
						// going.
						if running
							.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
							.is_err()
						{
							warn!("previous fleet run still in flight, skipping tick");
							continue;
						}

						let runner = Arc::clone(&runner);
						let guard = RunningGuard(Arc::clone(&running));
						current_run = Some(tokio::spawn(async move {
							let _guard = guard;
							match runner.run_once().await {
								Ok(summary) => info!(
									total = summary.total,
									succeeded = summary.succeeded,
									failed = summary.failed,
									"scheduled fleet run finished"
								),
								Err(e) => error!(error = %e, "scheduled fleet run failed"),
							}
						}));
					}
					_ = shutdown_rx.recv() => {
						if let Some(run) = current_run.take() {
							info!("waiting for in-flight fleet run before shutdown");
							let _ = run.await;
						}
						info!("refresh scheduler stopped");
						break;
					}
				}
			}
		});

		*self.handle.lock().await = Some(handle);
		info!("refresh scheduler started");
	}

	/// Stop the scheduling loop, waiting for any in-flight run.
	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		let _ = self.shutdown_tx.send(());
		if let Some(handle) = self.handle.lock().await.take() {
			let _ = handle.await;
		}
	}
}
