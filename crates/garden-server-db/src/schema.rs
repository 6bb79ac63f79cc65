// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity schema.
//!
//! Every statement is idempotent, so [`create_identity_schema`] can run at
//! each startup against an existing database.

use sqlx::sqlite::SqlitePool;

use crate::error::Result;

const IDENTITY_SCHEMA: &[&str] = &[
	r#"
	CREATE TABLE IF NOT EXISTS accounts (
		id TEXT PRIMARY KEY,
		external_subject_id TEXT,
		email TEXT NOT NULL,
		username TEXT NOT NULL,
		email_verified INTEGER NOT NULL DEFAULT 0,
		photo_url TEXT,
		last_provider TEXT NOT NULL,
		created_at TEXT NOT NULL,
		last_authenticated_at TEXT,
		deleted_at TEXT
	)
	"#,
	"CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_email_live ON accounts(email) WHERE deleted_at IS NULL",
	"CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_username_live ON accounts(username) WHERE deleted_at IS NULL",
	"CREATE INDEX IF NOT EXISTS idx_accounts_external_subject ON accounts(external_subject_id)",
	r#"
	CREATE TABLE IF NOT EXISTS linked_identities (
		id TEXT PRIMARY KEY,
		account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
		provider TEXT NOT NULL,
		external_subject_id TEXT NOT NULL,
		created_at TEXT NOT NULL,
		UNIQUE(provider, external_subject_id)
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS workspaces (
		id TEXT PRIMARY KEY,
		owner_id TEXT NOT NULL REFERENCES accounts(id),
		name TEXT NOT NULL,
		created_at TEXT NOT NULL,
		updated_at TEXT NOT NULL
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS workspace_memberships (
		workspace_id TEXT NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
		account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
		role TEXT NOT NULL CHECK (role IN ('admin', 'member', 'viewer')),
		joined_at TEXT NOT NULL,
		UNIQUE(workspace_id, account_id)
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS sessions (
		id TEXT PRIMARY KEY,
		account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
		device_id TEXT,
		device_metadata TEXT,
		ip_address TEXT,
		user_agent TEXT,
		created_at TEXT NOT NULL,
		expires_at TEXT NOT NULL,
		revoked_at TEXT
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_sessions_account ON sessions(account_id)",
	r#"
	CREATE TABLE IF NOT EXISTS audit_events (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		account_id TEXT,
		event_kind TEXT NOT NULL,
		severity TEXT NOT NULL,
		success INTEGER NOT NULL,
		ip_address TEXT,
		user_agent TEXT,
		metadata TEXT NOT NULL,
		created_at TEXT NOT NULL
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_audit_events_account_time ON audit_events(account_id, created_at)",
];

/// Creates the account, linked-identity, workspace, session and audit tables
/// with their indexes if they do not already exist.
#[tracing::instrument(skip(pool))]
pub async fn create_identity_schema(pool: &SqlitePool) -> Result<()> {
	let mut tx = pool.begin().await?;
	for statement in IDENTITY_SCHEMA {
		sqlx::query(statement).execute(&mut *tx).await?;
	}
	tx.commit().await?;

	tracing::debug!(statements = IDENTITY_SCHEMA.len(), "identity schema applied");
	Ok(())
}
