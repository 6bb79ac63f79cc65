// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Linked-identity repository.
//!
//! A `(provider, external_subject_id)` pair maps to at most one account.

use async_trait::async_trait;
use garden_server_auth::{AccountId, LinkedIdentity, ProviderTag};
use sqlx::{
	sqlite::{SqlitePool, SqliteRow},
	Row, SqliteConnection,
};

use crate::convert::{format_ts, parse_id, parse_ts};
use crate::error::DbError;

#[async_trait]
pub trait LinkedIdentityStore: Send + Sync {
	async fn link_identity(&self, identity: &LinkedIdentity) -> Result<bool, DbError>;
	async fn get_identity_by_provider(
		&self,
		provider: &ProviderTag,
		external_subject_id: &str,
	) -> Result<Option<LinkedIdentity>, DbError>;
	async fn list_identities_for_account(
		&self,
		account_id: &AccountId,
	) -> Result<Vec<LinkedIdentity>, DbError>;
}

#[derive(Clone)]
pub struct LinkedIdentityRepository {
	pool: SqlitePool,
}

impl LinkedIdentityRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Links a provider identity to an account.
	///
	/// Returns `true` when a new row was written and `false` when the same
	/// account already owned the pair. A pair owned by a different account is
	/// a [`DbError::Conflict`].
	#[tracing::instrument(skip(self, identity), fields(account_id = %identity.account_id, provider = %identity.provider))]
	pub async fn link_identity(&self, identity: &LinkedIdentity) -> Result<bool, DbError> {
		let mut conn = self.pool.acquire().await?;
		let inserted = sqlx::query(
			r#"
			INSERT INTO linked_identities (id, account_id, provider, external_subject_id, created_at)
			VALUES (?, ?, ?, ?, ?)
			ON CONFLICT(provider, external_subject_id) DO NOTHING
			"#,
		)
		.bind(identity.id.to_string())
		.bind(identity.account_id.to_string())
		.bind(identity.provider.as_str())
		.bind(&identity.external_subject_id)
		.bind(format_ts(&identity.created_at))
		.execute(&mut *conn)
		.await
		.map_err(DbError::from_write)?
		.rows_affected()
			> 0;

		if inserted {
			tracing::debug!(account_id = %identity.account_id, "linked identity created");
			return Ok(true);
		}

		let owner: Option<(String,)> = sqlx::query_as(
			"SELECT account_id FROM linked_identities WHERE provider = ? AND external_subject_id = ?",
		)
		.bind(identity.provider.as_str())
		.bind(&identity.external_subject_id)
		.fetch_optional(&mut *conn)
		.await?;

		match owner {
			Some((owner,)) if owner == identity.account_id.to_string() => Ok(false),
			_ => Err(DbError::Conflict(
				"provider identity is linked to another account".to_string(),
			)),
		}
	}

	#[tracing::instrument(skip(self, external_subject_id), fields(provider = %provider))]
	pub async fn get_identity_by_provider(
		&self,
		provider: &ProviderTag,
		external_subject_id: &str,
	) -> Result<Option<LinkedIdentity>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, account_id, provider, external_subject_id, created_at
			FROM linked_identities
			WHERE provider = ? AND external_subject_id = ?
			"#,
		)
		.bind(provider.as_str())
		.bind(external_subject_id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_identity(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(account_id = %account_id))]
	pub async fn list_identities_for_account(
		&self,
		account_id: &AccountId,
	) -> Result<Vec<LinkedIdentity>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, account_id, provider, external_subject_id, created_at
			FROM linked_identities
			WHERE account_id = ?
			ORDER BY created_at ASC
			"#,
		)
		.bind(account_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_identity).collect()
	}
}

#[async_trait]
impl LinkedIdentityStore for LinkedIdentityRepository {
	async fn link_identity(&self, identity: &LinkedIdentity) -> Result<bool, DbError> {
		self.link_identity(identity).await
	}

	async fn get_identity_by_provider(
		&self,
		provider: &ProviderTag,
		external_subject_id: &str,
	) -> Result<Option<LinkedIdentity>, DbError> {
		self
			.get_identity_by_provider(provider, external_subject_id)
			.await
	}

	async fn list_identities_for_account(
		&self,
		account_id: &AccountId,
	) -> Result<Vec<LinkedIdentity>, DbError> {
		self.list_identities_for_account(account_id).await
	}
}

/// Strict insert used by account bootstrap; any duplicate is a conflict.
pub(crate) async fn insert_linked_identity(
	conn: &mut SqliteConnection,
	identity: &LinkedIdentity,
) -> Result<(), DbError> {
	sqlx::query(
		r#"
		INSERT INTO linked_identities (id, account_id, provider, external_subject_id, created_at)
		VALUES (?, ?, ?, ?, ?)
		"#,
	)
	.bind(identity.id.to_string())
	.bind(identity.account_id.to_string())
	.bind(identity.provider.as_str())
	.bind(&identity.external_subject_id)
	.bind(format_ts(&identity.created_at))
	.execute(&mut *conn)
	.await
	.map_err(DbError::from_write)?;

	Ok(())
}

fn row_to_identity(row: &SqliteRow) -> Result<LinkedIdentity, DbError> {
	let id: String = row.get("id");
	let account_id: String = row.get("account_id");
	let provider: String = row.get("provider");
	let created_at: String = row.get("created_at");

	Ok(LinkedIdentity {
		id: parse_id("linked identity id", &id)?,
		account_id: parse_id("account_id", &account_id)?,
		provider: ProviderTag::new(provider)
			.map_err(|e| DbError::Internal(format!("Invalid provider: {e}")))?,
		external_subject_id: row.get("external_subject_id"),
		created_at: parse_ts("created_at", &created_at)?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{count_rows, create_identity_test_pool, insert_test_account};

	fn google() -> ProviderTag {
		ProviderTag::new(ProviderTag::GOOGLE).unwrap()
	}

	#[tokio::test]
	async fn link_is_idempotent_for_same_account() {
		let pool = create_identity_test_pool().await;
		let repo = LinkedIdentityRepository::new(pool.clone());
		let account = insert_test_account(&pool, "alice@example.com", "alice").await;

		let first = LinkedIdentity::new(account.id, google(), "g-123");
		assert!(repo.link_identity(&first).await.unwrap());

		let again = LinkedIdentity::new(account.id, google(), "g-123");
		assert!(!repo.link_identity(&again).await.unwrap());

		assert_eq!(count_rows(&pool, "linked_identities").await, 1);
	}

	#[tokio::test]
	async fn link_owned_by_other_account_is_conflict() {
		let pool = create_identity_test_pool().await;
		let repo = LinkedIdentityRepository::new(pool.clone());
		let alice = insert_test_account(&pool, "alice@example.com", "alice").await;
		let bob = insert_test_account(&pool, "bob@example.com", "bob").await;

		repo.link_identity(&LinkedIdentity::new(alice.id, google(), "g-shared"))
			.await
			.unwrap();
		let err = repo
			.link_identity(&LinkedIdentity::new(bob.id, google(), "g-shared"))
			.await
			.unwrap_err();
		assert!(err.is_conflict());
	}

	#[tokio::test]
	async fn same_subject_under_different_providers_is_allowed() {
		let pool = create_identity_test_pool().await;
		let repo = LinkedIdentityRepository::new(pool.clone());
		let account = insert_test_account(&pool, "alice@example.com", "alice").await;
		let apple = ProviderTag::new(ProviderTag::APPLE).unwrap();

		assert!(repo
			.link_identity(&LinkedIdentity::new(account.id, google(), "sub-1"))
			.await
			.unwrap());
		assert!(repo
			.link_identity(&LinkedIdentity::new(account.id, apple.clone(), "sub-1"))
			.await
			.unwrap());

		let listed = repo.list_identities_for_account(&account.id).await.unwrap();
		assert_eq!(listed.len(), 2);

		let found = repo
			.get_identity_by_provider(&apple, "sub-1")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(found.account_id, account.id);
		assert_eq!(found.provider, apple);
	}

	#[tokio::test]
	async fn strict_insert_rejects_duplicates() {
		let pool = create_identity_test_pool().await;
		let account = insert_test_account(&pool, "alice@example.com", "alice").await;
		let mut conn = pool.acquire().await.unwrap();

		insert_linked_identity(&mut conn, &LinkedIdentity::new(account.id, google(), "g-1"))
			.await
			.unwrap();
		let err =
			insert_linked_identity(&mut conn, &LinkedIdentity::new(account.id, google(), "g-1"))
				.await
				.unwrap_err();
		assert!(err.is_conflict());
	}
}
