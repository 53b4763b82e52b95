// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Machine-account identity generation.
//!
//! Machine-account names must be globally unique per creation attempt, so the
//! generator is an injected trait rather than inline randomness: production
//! wiring uses [`SystemIdentityGenerator`], tests use
//! [`FixedIdentityGenerator`] for deterministic values.

use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

const PASSWORD_LENGTH: usize = 32;

/// Source of machine-account names and passwords.
pub trait MachineIdentityGenerator: Send + Sync {
	/// A globally unique account name.
	fn account_name(&self) -> String;

	/// A freshly generated account password.
	fn account_password(&self) -> String;
}

/// UUID- and RNG-backed generator used by the daemon.
#[derive(Debug, Clone)]
pub struct SystemIdentityGenerator {
	prefix: String,
}

impl SystemIdentityGenerator {
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
		}
	}
}

impl Default for SystemIdentityGenerator {
	fn default() -> Self {
		Self::new("warden")
	}
}

impl MachineIdentityGenerator for SystemIdentityGenerator {
	fn account_name(&self) -> String {
		format!("{}-{}", self.prefix, Uuid::new_v4().simple())
	}

	fn account_password(&self) -> String {
		rand::thread_rng()
			.sample_iter(&Alphanumeric)
			.take(PASSWORD_LENGTH)
			.map(char::from)
			.collect()
	}
}

/// Deterministic generator for tests.
#[derive(Debug, Clone)]
pub struct FixedIdentityGenerator {
	pub name: String,
	pub password: String,
}

impl FixedIdentityGenerator {
	pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			password: password.into(),
		}
	}
}

impl MachineIdentityGenerator for FixedIdentityGenerator {
	fn account_name(&self) -> String {
		self.name.clone()
	}

	fn account_password(&self) -> String {
		self.password.clone()
	}
}
