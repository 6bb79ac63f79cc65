// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Transactional account bootstrap.
//!
//! A new account is created together with its default workspace, the owner's
//! admin membership and the linked identity that authenticated it. All four
//! rows are written inside one transaction; either all of them exist or none
//! do. Username allocation runs inside the same transaction so it sees the
//! transaction's own writes.
//!
//! The transaction starts with `BEGIN IMMEDIATE` so the write lock is held
//! before the username availability reads. Concurrent bootstraps queue on the
//! lock instead of failing on a stale snapshot, and a loser that arrives after
//! the winner commits sees its rows and fails with [`DbError::Conflict`].
//!
//! The transaction is committed only after every insert succeeds. Any error
//! triggers an explicit rollback, and dropping the transaction (panic, task
//! cancellation, deadline) rolls back as well.

use async_trait::async_trait;
use chrono::Utc;
use garden_server_auth::{
	username_with_suffix, Account, AccountId, LinkedIdentity, NewAccount, Workspace, WorkspaceRole,
	USERNAME_FALLBACK_SUFFIX_LEN, USERNAME_RETRY_LIMIT, USERNAME_SUFFIX_LEN,
};
use sqlx::{sqlite::SqlitePool, SqliteConnection};

use crate::account::{insert_account, is_username_available};
use crate::error::DbError;
use crate::identity::insert_linked_identity;
use crate::workspace::{insert_membership, insert_workspace};

/// Everything the bootstrap transaction created.
#[derive(Debug, Clone)]
pub struct BootstrappedAccount {
	pub account: Account,
	pub workspace: Workspace,
	pub linked_identity: LinkedIdentity,
}

#[async_trait]
pub trait BootstrapStore: Send + Sync {
	async fn bootstrap_account(&self, new_account: &NewAccount)
		-> Result<BootstrappedAccount, DbError>;
}

#[derive(Clone)]
pub struct BootstrapRepository {
	pool: SqlitePool,
}

impl BootstrapRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, new_account), fields(provider = %new_account.provider))]
	pub async fn bootstrap_account(
		&self,
		new_account: &NewAccount,
	) -> Result<BootstrappedAccount, DbError> {
		let mut tx = self
			.pool
			.begin_with("BEGIN IMMEDIATE")
			.await
			.map_err(DbError::from_write)?;

		match bootstrap_in(&mut tx, new_account).await {
			Ok(created) => {
				tx.commit().await.map_err(DbError::from_write)?;
				tracing::debug!(
					account_id = %created.account.id,
					workspace_id = %created.workspace.id,
					"account bootstrapped"
				);
				Ok(created)
			}
			Err(e) => {
				if let Err(rollback_err) = tx.rollback().await {
					tracing::warn!(error = %rollback_err, "bootstrap rollback failed");
				}
				Err(e)
			}
		}
	}
}

#[async_trait]
impl BootstrapStore for BootstrapRepository {
	async fn bootstrap_account(
		&self,
		new_account: &NewAccount,
	) -> Result<BootstrappedAccount, DbError> {
		self.bootstrap_account(new_account).await
	}
}

pub(crate) async fn bootstrap_in(
	conn: &mut SqliteConnection,
	new_account: &NewAccount,
) -> Result<BootstrappedAccount, DbError> {
	let username = allocate_username(conn, &new_account.username_base()).await?;
	let now = Utc::now();

	let account = Account {
		id: AccountId::generate(),
		external_subject_id: Some(new_account.external_subject_id.clone()),
		email: new_account.email.clone(),
		username,
		email_verified: new_account.email_verified,
		photo_url: new_account.photo_url.clone(),
		last_provider: new_account.provider.clone(),
		created_at: now,
		last_authenticated_at: Some(now),
		deleted_at: None,
	};
	insert_account(conn, &account).await?;

	let workspace = Workspace::default_for(account.id, &account.username);
	insert_workspace(conn, &workspace).await?;
	insert_membership(conn, &workspace.id, &account.id, WorkspaceRole::Admin).await?;

	let linked_identity = LinkedIdentity::new(
		account.id,
		new_account.provider.clone(),
		new_account.external_subject_id.clone(),
	);
	insert_linked_identity(conn, &linked_identity).await?;

	Ok(BootstrappedAccount {
		account,
		workspace,
		linked_identity,
	})
}

/// Picks a username not held by any live account.
///
/// Tries `base`, then up to [`USERNAME_RETRY_LIMIT`] suffixed candidates, then
/// returns a candidate with the longer fallback suffix unchecked. The unique
/// index on `username` stays the final arbiter.
pub(crate) async fn allocate_username(
	conn: &mut SqliteConnection,
	base: &str,
) -> Result<String, DbError> {
	allocate_username_with(conn, base, username_with_suffix).await
}

async fn allocate_username_with<F>(
	conn: &mut SqliteConnection,
	base: &str,
	mut candidate: F,
) -> Result<String, DbError>
where
	F: FnMut(&str, usize) -> String,
{
	if is_username_available(conn, base).await? {
		return Ok(base.to_string());
	}

	for attempt in 1..=USERNAME_RETRY_LIMIT {
		let name = candidate(base, USERNAME_SUFFIX_LEN);
		if is_username_available(conn, &name).await? {
			return Ok(name);
		}
		tracing::debug!(attempt, "username candidate taken");
	}

	tracing::debug!("username retries exhausted, using fallback suffix");
	Ok(candidate(base, USERNAME_FALLBACK_SUFFIX_LEN))
}
