// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Workspace repository for database operations.
//!
//! This module provides database access for:
//! - Workspaces an account belongs to, newest first
//! - Memberships and their roles

use async_trait::async_trait;
use chrono::Utc;
use garden_server_auth::{AccountId, Workspace, WorkspaceId, WorkspaceMembership, WorkspaceRole};
use sqlx::{
	sqlite::{SqlitePool, SqliteRow},
	Row, SqliteConnection,
};

use crate::convert::{format_ts, parse_id, parse_ts};
use crate::error::DbError;

#[async_trait]
pub trait WorkspaceStore: Send + Sync {
	async fn create_workspace(&self, workspace: &Workspace) -> Result<(), DbError>;
	async fn get_workspace(&self, id: &WorkspaceId) -> Result<Option<Workspace>, DbError>;
	async fn list_workspaces_for_account(
		&self,
		account_id: &AccountId,
	) -> Result<Vec<Workspace>, DbError>;
	async fn add_member(
		&self,
		workspace_id: &WorkspaceId,
		account_id: &AccountId,
		role: WorkspaceRole,
	) -> Result<bool, DbError>;
	async fn get_membership_role(
		&self,
		workspace_id: &WorkspaceId,
		account_id: &AccountId,
	) -> Result<Option<WorkspaceRole>, DbError>;
	async fn list_members(
		&self,
		workspace_id: &WorkspaceId,
	) -> Result<Vec<WorkspaceMembership>, DbError>;
}

#[derive(Clone)]
pub struct WorkspaceRepository {
	pool: SqlitePool,
}

impl WorkspaceRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Creates a workspace and makes its owner an admin, atomically.
	#[tracing::instrument(skip(self, workspace), fields(workspace_id = %workspace.id, owner_id = %workspace.owner_id))]
	pub async fn create_workspace(&self, workspace: &Workspace) -> Result<(), DbError> {
		let mut tx = self.pool.begin().await?;
		insert_workspace(&mut tx, workspace).await?;
		insert_membership(
			&mut tx,
			&workspace.id,
			&workspace.owner_id,
			WorkspaceRole::Admin,
		)
		.await?;
		tx.commit().await?;

		tracing::debug!(workspace_id = %workspace.id, "workspace created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(workspace_id = %id))]
	pub async fn get_workspace(&self, id: &WorkspaceId) -> Result<Option<Workspace>, DbError> {
		let row = sqlx::query(
			"SELECT id, owner_id, name, created_at, updated_at FROM workspaces WHERE id = ?",
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_workspace(&r)).transpose()
	}

	/// Every workspace the account is a member of, ordered by creation time
	/// descending.
	#[tracing::instrument(skip(self), fields(account_id = %account_id))]
	pub async fn list_workspaces_for_account(
		&self,
		account_id: &AccountId,
	) -> Result<Vec<Workspace>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT w.id, w.owner_id, w.name, w.created_at, w.updated_at
			FROM workspaces w
			INNER JOIN workspace_memberships m ON m.workspace_id = w.id
			WHERE m.account_id = ?
			ORDER BY w.created_at DESC, w.id DESC
			"#,
		)
		.bind(account_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_workspace).collect()
	}

	/// Returns `false` when the account was already a member; the existing
	/// role is left untouched.
	#[tracing::instrument(skip(self), fields(workspace_id = %workspace_id, account_id = %account_id, role = %role))]
	pub async fn add_member(
		&self,
		workspace_id: &WorkspaceId,
		account_id: &AccountId,
		role: WorkspaceRole,
	) -> Result<bool, DbError> {
		let mut conn = self.pool.acquire().await?;
		insert_membership(&mut conn, workspace_id, account_id, role).await
	}

	#[tracing::instrument(skip(self), fields(workspace_id = %workspace_id, account_id = %account_id))]
	pub async fn get_membership_role(
		&self,
		workspace_id: &WorkspaceId,
		account_id: &AccountId,
	) -> Result<Option<WorkspaceRole>, DbError> {
		let role: Option<(String,)> = sqlx::query_as(
			"SELECT role FROM workspace_memberships WHERE workspace_id = ? AND account_id = ?",
		)
		.bind(workspace_id.to_string())
		.bind(account_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		role.map(|(r,)| parse_role(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(workspace_id = %workspace_id))]
	pub async fn list_members(
		&self,
		workspace_id: &WorkspaceId,
	) -> Result<Vec<WorkspaceMembership>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT workspace_id, account_id, role, joined_at
			FROM workspace_memberships
			WHERE workspace_id = ?
			ORDER BY joined_at ASC
			"#,
		)
		.bind(workspace_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_membership).collect()
	}
}

#[async_trait]
impl WorkspaceStore for WorkspaceRepository {
	async fn create_workspace(&self, workspace: &Workspace) -> Result<(), DbError> {
		self.create_workspace(workspace).await
	}

	async fn get_workspace(&self, id: &WorkspaceId) -> Result<Option<Workspace>, DbError> {
		self.get_workspace(id).await
	}

	async fn list_workspaces_for_account(
		&self,
		account_id: &AccountId,
	) -> Result<Vec<Workspace>, DbError> {
		self.list_workspaces_for_account(account_id).await
	}

	async fn add_member(
		&self,
		workspace_id: &WorkspaceId,
		account_id: &AccountId,
		role: WorkspaceRole,
	) -> Result<bool, DbError> {
		self.add_member(workspace_id, account_id, role).await
	}

	async fn get_membership_role(
		&self,
		workspace_id: &WorkspaceId,
		account_id: &AccountId,
	) -> Result<Option<WorkspaceRole>, DbError> {
		self.get_membership_role(workspace_id, account_id).await
	}

	async fn list_members(
		&self,
		workspace_id: &WorkspaceId,
	) -> Result<Vec<WorkspaceMembership>, DbError> {
		self.list_members(workspace_id).await
	}
}

// =============================================================================
// Connection-level helpers (usable inside a transaction)
// =============================================================================

pub(crate) async fn insert_workspace(
	conn: &mut SqliteConnection,
	workspace: &Workspace,
) -> Result<(), DbError> {
	sqlx::query(
		r#"
		INSERT INTO workspaces (id, owner_id, name, created_at, updated_at)
		VALUES (?, ?, ?, ?, ?)
		"#,
	)
	.bind(workspace.id.to_string())
	.bind(workspace.owner_id.to_string())
	.bind(&workspace.name)
	.bind(format_ts(&workspace.created_at))
	.bind(format_ts(&workspace.updated_at))
	.execute(&mut *conn)
	.await
	.map_err(DbError::from_write)?;

	Ok(())
}

/// Insert-or-ignore on `(workspace_id, account_id)`.
pub(crate) async fn insert_membership(
	conn: &mut SqliteConnection,
	workspace_id: &WorkspaceId,
	account_id: &AccountId,
	role: WorkspaceRole,
) -> Result<bool, DbError> {
	let result = sqlx::query(
		r#"
		INSERT OR IGNORE INTO workspace_memberships (workspace_id, account_id, role, joined_at)
		VALUES (?, ?, ?, ?)
		"#,
	)
	.bind(workspace_id.to_string())
	.bind(account_id.to_string())
	.bind(role.to_string())
	.bind(format_ts(&Utc::now()))
	.execute(&mut *conn)
	.await
	.map_err(DbError::from_write)?;

	Ok(result.rows_affected() > 0)
}

fn parse_role(value: &str) -> Result<WorkspaceRole, DbError> {
	value
		.parse()
		.map_err(|e| DbError::Internal(format!("Invalid role: {e}")))
}

fn row_to_workspace(row: &SqliteRow) -> Result<Workspace, DbError> {
	let id: String = row.get("id");
	let owner_id: String = row.get("owner_id");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(Workspace {
		id: parse_id("workspace id", &id)?,
		owner_id: parse_id("owner_id", &owner_id)?,
		name: row.get("name"),
		created_at: parse_ts("created_at", &created_at)?,
		updated_at: parse_ts("updated_at", &updated_at)?,
	})
}

fn row_to_membership(row: &SqliteRow) -> Result<WorkspaceMembership, DbError> {
	let workspace_id: String = row.get("workspace_id");
	let account_id: String = row.get("account_id");
	let role: String = row.get("role");
	let joined_at: String = row.get("joined_at");

	Ok(WorkspaceMembership {
		workspace_id: parse_id("workspace_id", &workspace_id)?,
		account_id: parse_id("account_id", &account_id)?,
		role: parse_role(&role)?,
		joined_at: parse_ts("joined_at", &joined_at)?,
	})
}
