// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schema setup for the credential store.

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

/// Create the `org_records` table if it does not exist.
///
/// Token bundles and the decoded connection-data cache are stored as JSON
/// text columns; everything else is a scalar column.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS org_records (
			record_id TEXT PRIMARY KEY,
			username TEXT,
			password TEXT,
			org_id TEXT,
			client_id TEXT,
			client_secret TEXT,
			connection_data_string TEXT,
			connection_data TEXT,
			lab_mode INTEGER NOT NULL DEFAULT 0,
			admin_access_token TEXT,
			machine_account_name TEXT,
			machine_account_password TEXT,
			machine_account_id TEXT,
			machine_bearer TEXT,
			access_token TEXT,
			updated_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	tracing::debug!("database migrations applied");
	Ok(())
}
