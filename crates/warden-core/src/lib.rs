// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Domain model for the Warden credential lifecycle daemon.
//!
//! This crate holds the per-org credential record, token bundle, decoded
//! connection data, and the machine-identity generator seam shared by the
//! store, the provider client, and the lifecycle state machine.

pub mod connection;
pub mod generate;
pub mod record;

pub use connection::{ConnectionData, CredentialBlock, DerivedCredentials};
pub use generate::{FixedIdentityGenerator, MachineIdentityGenerator, SystemIdentityGenerator};
pub use record::{OrgRecord, TokenBundle};
