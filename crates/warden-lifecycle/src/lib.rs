// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential lifecycle for the Warden daemon.
//!
//! The three moving parts, outermost first:
//! - [`RefreshScheduler`] triggers a fleet run at startup and on a fixed
//!   interval, skipping ticks that would overlap an in-flight run.
//! - [`FleetRunner`] executes one pass over every org record, isolating
//!   per-record failures and persisting each record unconditionally so
//!   partial progress survives.
//! - [`OrgStateMachine`] advances a single record through presence-gated
//!   bootstrap and refresh stages.

pub mod error;
pub mod machine;
pub mod run;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{RunError, StageError};
pub use machine::OrgStateMachine;
pub use run::{FleetRunner, RunSummary};
pub use scheduler::RefreshScheduler;
