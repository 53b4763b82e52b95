// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity provider client for the Warden daemon.
//!
//! Stateless request functions against the remote identity provider: admin
//! authentication, machine-account provisioning and token issuance/refresh,
//! plus pure decoding of operator-provisioned connection data. Every call
//! fails with a typed [`ProviderError`] carrying the provider's status code.

pub mod client;
pub mod connection;
pub mod error;

pub use client::{HttpIdentityProvider, IdentityProvider};
pub use connection::{decode_connection_data, derive_credentials};
pub use error::ProviderError;
