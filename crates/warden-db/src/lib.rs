// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential store for the Warden daemon.
//!
//! Durable keyed storage of [`warden_core::OrgRecord`] documents on SQLite.
//! The store contract is deliberately small: fetch the whole fleet, and
//! replace-or-insert one record by its immutable key.

pub mod error;
pub mod org;
pub mod pool;
pub mod schema;
pub mod testing;

pub use error::{DbError, Result};
pub use org::{OrgRepository, OrgStore};
pub use pool::create_pool;
pub use schema::run_migrations;
