// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Org record repository.
//!
//! Records are operator-provisioned; the daemon only reads the fleet and
//! writes enriched records back. Deleting a record is an external
//! administrative action, so there is deliberately no delete operation here.

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use warden_core::{ConnectionData, OrgRecord, TokenBundle};

use crate::error::DbError;

/// Store contract consumed by the lifecycle machinery.
#[async_trait]
pub trait OrgStore: Send + Sync {
	/// All records in the fleet. An empty vec is a valid result, distinct
	/// from a connectivity failure.
	async fn find_all(&self) -> Result<Vec<OrgRecord>, DbError>;

	/// Replace-or-insert by `record_id`.
	async fn upsert(&self, record: &OrgRecord) -> Result<(), DbError>;
}

/// SQLite-backed repository for org records.
#[derive(Clone)]
pub struct OrgRepository {
	pool: SqlitePool,
}

impl OrgRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	fn row_to_record(&self, row: &SqliteRow) -> Result<OrgRecord, DbError> {
		Ok(OrgRecord {
			record_id: row.try_get("record_id")?,
			username: row.try_get("username")?,
			password: row.try_get("password")?,
			org_id: row.try_get("org_id")?,
			client_id: row.try_get("client_id")?,
			client_secret: row.try_get("client_secret")?,
			connection_data_string: row.try_get("connection_data_string")?,
			connection_data: from_json_column::<ConnectionData>(row, "connection_data")?,
			lab_mode: row.try_get::<i32, _>("lab_mode")? != 0,
			admin_access_token: from_json_column::<TokenBundle>(row, "admin_access_token")?,
			machine_account_name: row.try_get("machine_account_name")?,
			machine_account_password: row.try_get("machine_account_password")?,
			machine_account_id: row.try_get("machine_account_id")?,
			machine_bearer: row.try_get("machine_bearer")?,
			access_token: from_json_column::<TokenBundle>(row, "access_token")?,
		})
	}
}

fn from_json_column<T: DeserializeOwned>(
	row: &SqliteRow,
	column: &str,
) -> Result<Option<T>, DbError> {
	let raw: Option<String> = row.try_get(column)?;
	raw.map(|s| serde_json::from_str(&s)).transpose().map_err(DbError::from)
}

fn to_json_column<T: Serialize>(value: &Option<T>) -> Result<Option<String>, DbError> {
	value
		.as_ref()
		.map(serde_json::to_string)
		.transpose()
		.map_err(DbError::from)
}

#[async_trait]
impl OrgStore for OrgRepository {
	#[tracing::instrument(skip(self))]
	async fn find_all(&self) -> Result<Vec<OrgRecord>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT record_id, username, password, org_id, client_id, client_secret,
			       connection_data_string, connection_data, lab_mode,
			       admin_access_token, machine_account_name, machine_account_password,
			       machine_account_id, machine_bearer, access_token
			FROM org_records
			ORDER BY record_id
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		let records = rows
			.iter()
			.map(|row| self.row_to_record(row))
			.collect::<Result<Vec<_>, _>>()?;

		tracing::debug!(count = records.len(), "fetched org records");
		Ok(records)
	}

	#[tracing::instrument(skip(self, record), fields(record_id = %record.record_id))]
	async fn upsert(&self, record: &OrgRecord) -> Result<(), DbError> {
		let now = Utc::now().to_rfc3339();
		sqlx::query(
			r#"
			INSERT INTO org_records (
				record_id, username, password, org_id, client_id, client_secret,
				connection_data_string, connection_data, lab_mode,
				admin_access_token, machine_account_name, machine_account_password,
				machine_account_id, machine_bearer, access_token, updated_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			ON CONFLICT(record_id) DO UPDATE SET
				username = excluded.username,
				password = excluded.password,
				org_id = excluded.org_id,
				client_id = excluded.client_id,
				client_secret = excluded.client_secret,
				connection_data_string = excluded.connection_data_string,
				connection_data = excluded.connection_data,
				lab_mode = excluded.lab_mode,
				admin_access_token = excluded.admin_access_token,
				machine_account_name = excluded.machine_account_name,
				machine_account_password = excluded.machine_account_password,
				machine_account_id = excluded.machine_account_id,
				machine_bearer = excluded.machine_bearer,
				access_token = excluded.access_token,
				updated_at = excluded.updated_at
			"#,
		)
		.bind(&record.record_id)
		.bind(&record.username)
		.bind(&record.password)
		.bind(&record.org_id)
		.bind(&record.client_id)
		.bind(&record.client_secret)
		.bind(&record.connection_data_string)
		.bind(to_json_column(&record.connection_data)?)
		.bind(record.lab_mode as i32)
		.bind(to_json_column(&record.admin_access_token)?)
		.bind(&record.machine_account_name)
		.bind(&record.machine_account_password)
		.bind(&record.machine_account_id)
		.bind(&record.machine_bearer)
		.bind(to_json_column(&record.access_token)?)
		.bind(now)
		.execute(&self.pool)
		.await?;

		tracing::debug!(record_id = %record.record_id, "org record upserted");
		Ok(())
	}
}
