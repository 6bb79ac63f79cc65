// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session repository for database operations.
//!
//! This module provides database access for session management including:
//! - Creating sessions and listing the active ones for an account
//! - Individually addressed revocation, reporting missing or already-revoked rows
//! - Bulk revocation by device or for a whole account, skipping revoked rows
//! - Sweeping rows whose expiry has passed

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use garden_server_auth::{AccountId, Session, SessionId};
use sqlx::{
	sqlite::{SqlitePool, SqliteRow},
	Row,
};

use crate::convert::{format_ts, parse_id, parse_opt_ts, parse_ts};
use crate::error::DbError;

const SESSION_COLUMNS: &str = "id, account_id, device_id, device_metadata, ip_address, \
	user_agent, created_at, expires_at, revoked_at";

/// Result of revoking one specific session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
	Revoked,
	NotFound,
	AlreadyRevoked,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
	async fn create_session(&self, session: &Session) -> Result<(), DbError>;
	async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, DbError>;
	async fn list_active_sessions_for_account(
		&self,
		account_id: &AccountId,
		now: DateTime<Utc>,
	) -> Result<Vec<Session>, DbError>;
	async fn revoke_session(&self, id: &SessionId) -> Result<RevokeOutcome, DbError>;
	async fn revoke_sessions_for_device(
		&self,
		account_id: &AccountId,
		device_id: &str,
	) -> Result<u64, DbError>;
	async fn revoke_all_sessions_for_account(&self, account_id: &AccountId)
		-> Result<u64, DbError>;
	async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DbError>;
}

#[derive(Clone)]
pub struct SessionRepository {
	pool: SqlitePool,
}

impl SessionRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, session), fields(session_id = %session.id, account_id = %session.account_id))]
	pub async fn create_session(&self, session: &Session) -> Result<(), DbError> {
		let metadata = session
			.device_metadata
			.as_ref()
			.map(serde_json::to_string)
			.transpose()?;

		sqlx::query(
			r#"
			INSERT INTO sessions (
				id, account_id, device_id, device_metadata, ip_address,
				user_agent, created_at, expires_at, revoked_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(session.id.to_string())
		.bind(session.account_id.to_string())
		.bind(&session.device_id)
		.bind(metadata)
		.bind(&session.ip_address)
		.bind(&session.user_agent)
		.bind(format_ts(&session.created_at))
		.bind(format_ts(&session.expires_at))
		.bind(session.revoked_at.as_ref().map(format_ts))
		.execute(&self.pool)
		.await
		.map_err(DbError::from_write)?;

		tracing::debug!(session_id = %session.id, "session created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(session_id = %id))]
	pub async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, DbError> {
		let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?");
		let row = sqlx::query(&sql)
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| row_to_session(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(account_id = %account_id))]
	pub async fn list_active_sessions_for_account(
		&self,
		account_id: &AccountId,
		now: DateTime<Utc>,
	) -> Result<Vec<Session>, DbError> {
		let sql = format!(
			"SELECT {SESSION_COLUMNS} FROM sessions \
			 WHERE account_id = ? AND revoked_at IS NULL AND expires_at > ? \
			 ORDER BY created_at DESC"
		);
		let rows = sqlx::query(&sql)
			.bind(account_id.to_string())
			.bind(format_ts(&now))
			.fetch_all(&self.pool)
			.await?;

		rows.iter().map(row_to_session).collect()
	}

	#[tracing::instrument(skip(self), fields(session_id = %id))]
	pub async fn revoke_session(&self, id: &SessionId) -> Result<RevokeOutcome, DbError> {
		let result = sqlx::query("UPDATE sessions SET revoked_at = ? WHERE id = ? AND revoked_at IS NULL")
			.bind(format_ts(&Utc::now()))
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		if result.rows_affected() > 0 {
			tracing::debug!(session_id = %id, "session revoked");
			return Ok(RevokeOutcome::Revoked);
		}

		let exists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE id = ?")
			.bind(id.to_string())
			.fetch_one(&self.pool)
			.await?;

		Ok(if exists.0 > 0 {
			RevokeOutcome::AlreadyRevoked
		} else {
			RevokeOutcome::NotFound
		})
	}

	#[tracing::instrument(skip(self, device_id), fields(account_id = %account_id))]
	pub async fn revoke_sessions_for_device(
		&self,
		account_id: &AccountId,
		device_id: &str,
	) -> Result<u64, DbError> {
		let result = sqlx::query(
			r#"
			UPDATE sessions SET revoked_at = ?
			WHERE account_id = ? AND device_id = ? AND revoked_at IS NULL
			"#,
		)
		.bind(format_ts(&Utc::now()))
		.bind(account_id.to_string())
		.bind(device_id)
		.execute(&self.pool)
		.await?;

		let count = result.rows_affected();
		tracing::debug!(account_id = %account_id, count, "device sessions revoked");
		Ok(count)
	}

	#[tracing::instrument(skip(self), fields(account_id = %account_id))]
	pub async fn revoke_all_sessions_for_account(
		&self,
		account_id: &AccountId,
	) -> Result<u64, DbError> {
		let result =
			sqlx::query("UPDATE sessions SET revoked_at = ? WHERE account_id = ? AND revoked_at IS NULL")
				.bind(format_ts(&Utc::now()))
				.bind(account_id.to_string())
				.execute(&self.pool)
				.await?;

		let count = result.rows_affected();
		tracing::debug!(account_id = %account_id, count, "all sessions revoked");
		Ok(count)
	}

	#[tracing::instrument(skip(self))]
	pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
		let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
			.bind(format_ts(&now))
			.execute(&self.pool)
			.await?;

		let count = result.rows_affected();
		if count > 0 {
			tracing::debug!(count, "expired sessions deleted");
		}
		Ok(count)
	}
}

#[async_trait]
impl SessionStore for SessionRepository {
	async fn create_session(&self, session: &Session) -> Result<(), DbError> {
		self.create_session(session).await
	}

	async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, DbError> {
		self.get_session(id).await
	}

	async fn list_active_sessions_for_account(
		&self,
		account_id: &AccountId,
		now: DateTime<Utc>,
	) -> Result<Vec<Session>, DbError> {
		self.list_active_sessions_for_account(account_id, now).await
	}

	async fn revoke_session(&self, id: &SessionId) -> Result<RevokeOutcome, DbError> {
		self.revoke_session(id).await
	}

	async fn revoke_sessions_for_device(
		&self,
		account_id: &AccountId,
		device_id: &str,
	) -> Result<u64, DbError> {
		self.revoke_sessions_for_device(account_id, device_id).await
	}

	async fn revoke_all_sessions_for_account(
		&self,
		account_id: &AccountId,
	) -> Result<u64, DbError> {
		self.revoke_all_sessions_for_account(account_id).await
	}

	async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
		self.delete_expired_sessions(now).await
	}
}

fn row_to_session(row: &SqliteRow) -> Result<Session, DbError> {
	let id: String = row.get("id");
	let account_id: String = row.get("account_id");
	let metadata: Option<String> = row.get("device_metadata");
	let created_at: String = row.get("created_at");
	let expires_at: String = row.get("expires_at");

	Ok(Session {
		id: parse_id("session id", &id)?,
		account_id: parse_id("account_id", &account_id)?,
		device_id: row.get("device_id"),
		device_metadata: metadata.map(|m| serde_json::from_str(&m)).transpose()?,
		ip_address: row.get("ip_address"),
		user_agent: row.get("user_agent"),
		created_at: parse_ts("created_at", &created_at)?,
		expires_at: parse_ts("expires_at", &expires_at)?,
		revoked_at: parse_opt_ts("revoked_at", row.get("revoked_at"))?,
	})
}
