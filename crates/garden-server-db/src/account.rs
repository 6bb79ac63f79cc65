// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Account repository for database operations.
//!
//! Every lookup used by authentication excludes soft-deleted accounts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use garden_server_auth::{Account, AccountId, ProviderTag};
use sqlx::{
	sqlite::{SqlitePool, SqliteRow},
	Row, SqliteConnection,
};

use crate::convert::{format_ts, parse_id, parse_opt_ts, parse_ts};
use crate::error::DbError;

const ACCOUNT_COLUMNS: &str = "id, external_subject_id, email, username, email_verified, \
	photo_url, last_provider, created_at, last_authenticated_at, deleted_at";

#[async_trait]
pub trait AccountStore: Send + Sync {
	async fn get_account_by_id(&self, id: &AccountId) -> Result<Option<Account>, DbError>;
	async fn get_account_by_external_subject_id(
		&self,
		external_subject_id: &str,
	) -> Result<Option<Account>, DbError>;
	async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, DbError>;
	async fn is_username_available(&self, username: &str) -> Result<bool, DbError>;
	async fn record_login(
		&self,
		id: &AccountId,
		provider: &ProviderTag,
		at: DateTime<Utc>,
	) -> Result<(), DbError>;
	async fn record_linked_login(&self, id: &AccountId, login: &LinkedLogin) -> Result<(), DbError>;
	async fn soft_delete_account(&self, id: &AccountId) -> Result<bool, DbError>;
}

/// Account fields touched when an existing account signs in through a
/// newly linked provider.
#[derive(Debug, Clone)]
pub struct LinkedLogin {
	pub provider: ProviderTag,
	pub external_subject_id: String,
	/// Applied only when the account has no photo yet.
	pub photo_url: Option<String>,
	pub at: DateTime<Utc>,
}

/// Repository for account database operations.
#[derive(Clone)]
pub struct AccountRepository {
	pool: SqlitePool,
}

impl AccountRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self), fields(account_id = %id))]
	pub async fn get_account_by_id(&self, id: &AccountId) -> Result<Option<Account>, DbError> {
		let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ? AND deleted_at IS NULL");
		let row = sqlx::query(&sql)
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| row_to_account(&r)).transpose()
	}

	#[tracing::instrument(skip(self, external_subject_id))]
	pub async fn get_account_by_external_subject_id(
		&self,
		external_subject_id: &str,
	) -> Result<Option<Account>, DbError> {
		let sql = format!(
			"SELECT {ACCOUNT_COLUMNS} FROM accounts \
			 WHERE external_subject_id = ? AND deleted_at IS NULL \
			 ORDER BY created_at ASC LIMIT 1"
		);
		let row = sqlx::query(&sql)
			.bind(external_subject_id)
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| row_to_account(&r)).transpose()
	}

	#[tracing::instrument(skip(self, email))]
	pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, DbError> {
		let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ? AND deleted_at IS NULL");
		let row = sqlx::query(&sql)
			.bind(email)
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| row_to_account(&r)).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn is_username_available(&self, username: &str) -> Result<bool, DbError> {
		let mut conn = self.pool.acquire().await?;
		is_username_available(&mut conn, username).await
	}

	/// Existing-account path: stamp the sign-in time and provider.
	#[tracing::instrument(skip(self), fields(account_id = %id, provider = %provider))]
	pub async fn record_login(
		&self,
		id: &AccountId,
		provider: &ProviderTag,
		at: DateTime<Utc>,
	) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			UPDATE accounts
			SET last_authenticated_at = ?, last_provider = ?
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(format_ts(&at))
		.bind(provider.as_str())
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound("account".to_string()));
		}

		tracing::debug!(account_id = %id, "account login recorded");
		Ok(())
	}

	/// Linking path: switch the provider tag, fill the photo and subject id
	/// only where they are unset.
	#[tracing::instrument(skip(self, login), fields(account_id = %id, provider = %login.provider))]
	pub async fn record_linked_login(
		&self,
		id: &AccountId,
		login: &LinkedLogin,
	) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			UPDATE accounts
			SET last_provider = ?,
				last_authenticated_at = ?,
				photo_url = COALESCE(photo_url, ?),
				external_subject_id = COALESCE(external_subject_id, ?)
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(login.provider.as_str())
		.bind(format_ts(&login.at))
		.bind(&login.photo_url)
		.bind(&login.external_subject_id)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound("account".to_string()));
		}

		tracing::debug!(account_id = %id, "linked login recorded");
		Ok(())
	}

	/// Marks the account deleted. Returns false if it was already gone.
	#[tracing::instrument(skip(self), fields(account_id = %id))]
	pub async fn soft_delete_account(&self, id: &AccountId) -> Result<bool, DbError> {
		let result =
			sqlx::query("UPDATE accounts SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
				.bind(format_ts(&Utc::now()))
				.bind(id.to_string())
				.execute(&self.pool)
				.await?;

		let deleted = result.rows_affected() > 0;
		tracing::debug!(account_id = %id, deleted, "account soft-deleted");
		Ok(deleted)
	}
}

#[async_trait]
impl AccountStore for AccountRepository {
	async fn get_account_by_id(&self, id: &AccountId) -> Result<Option<Account>, DbError> {
		self.get_account_by_id(id).await
	}

	async fn get_account_by_external_subject_id(
		&self,
		external_subject_id: &str,
	) -> Result<Option<Account>, DbError> {
		self
			.get_account_by_external_subject_id(external_subject_id)
			.await
	}

	async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, DbError> {
		self.get_account_by_email(email).await
	}

	async fn is_username_available(&self, username: &str) -> Result<bool, DbError> {
		self.is_username_available(username).await
	}

	async fn record_login(
		&self,
		id: &AccountId,
		provider: &ProviderTag,
		at: DateTime<Utc>,
	) -> Result<(), DbError> {
		self.record_login(id, provider, at).await
	}

	async fn record_linked_login(&self, id: &AccountId, login: &LinkedLogin) -> Result<(), DbError> {
		self.record_linked_login(id, login).await
	}

	async fn soft_delete_account(&self, id: &AccountId) -> Result<bool, DbError> {
		self.soft_delete_account(id).await
	}
}

// =============================================================================
// Connection-level helpers (usable inside a transaction)
// =============================================================================

pub(crate) async fn is_username_available(
	conn: &mut SqliteConnection,
	username: &str,
) -> Result<bool, DbError> {
	let count: (i64,) =
		sqlx::query_as("SELECT COUNT(*) FROM accounts WHERE username = ? AND deleted_at IS NULL")
			.bind(username)
			.fetch_one(&mut *conn)
			.await?;

	Ok(count.0 == 0)
}

pub(crate) async fn insert_account(
	conn: &mut SqliteConnection,
	account: &Account,
) -> Result<(), DbError> {
	sqlx::query(
		r#"
		INSERT INTO accounts (
			id, external_subject_id, email, username, email_verified,
			photo_url, last_provider, created_at, last_authenticated_at, deleted_at
		) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)
		"#,
	)
	.bind(account.id.to_string())
	.bind(&account.external_subject_id)
	.bind(&account.email)
	.bind(&account.username)
	.bind(account.email_verified as i32)
	.bind(&account.photo_url)
	.bind(account.last_provider.as_str())
	.bind(format_ts(&account.created_at))
	.bind(account.last_authenticated_at.as_ref().map(format_ts))
	.execute(&mut *conn)
	.await
	.map_err(DbError::from_write)?;

	Ok(())
}

fn row_to_account(row: &SqliteRow) -> Result<Account, DbError> {
	let id: String = row.get("id");
	let provider: String = row.get("last_provider");
	let created_at: String = row.get("created_at");
	let email_verified: i32 = row.get("email_verified");

	Ok(Account {
		id: parse_id("account id", &id)?,
		external_subject_id: row.get("external_subject_id"),
		email: row.get("email"),
		username: row.get("username"),
		email_verified: email_verified != 0,
		photo_url: row.get("photo_url"),
		last_provider: ProviderTag::new(provider)
			.map_err(|e| DbError::Internal(format!("Invalid last_provider: {e}")))?,
		created_at: parse_ts("created_at", &created_at)?,
		last_authenticated_at: parse_opt_ts("last_authenticated_at", row.get("last_authenticated_at"))?,
		deleted_at: parse_opt_ts("deleted_at", row.get("deleted_at"))?,
	})
}
