// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Test helpers: an in-memory pool with the identity schema applied, plus
//! fault injection and row counting.

use chrono::Utc;
use garden_server_auth::{Account, AccountId, ProviderTag};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::convert::format_ts;
use crate::schema::create_identity_schema;

/// Single-connection in-memory pool; every connection to `:memory:` is a
/// separate database.
pub async fn create_test_pool() -> SqlitePool {
	SqlitePoolOptions::new()
		.max_connections(1)
		.connect(":memory:")
		.await
		.unwrap()
}

/// Pool with the full identity schema.
pub async fn create_identity_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	create_identity_schema(&pool).await.unwrap();
	pool
}

/// Makes every linked-identity insert for `subject` fail mid-transaction.
pub async fn install_link_failure_trigger(pool: &SqlitePool, subject: &str) {
	let sql = format!(
		"CREATE TRIGGER fail_link_{tag} BEFORE INSERT ON linked_identities \
		 WHEN NEW.external_subject_id = '{subject}' \
		 BEGIN SELECT RAISE(ABORT, 'injected link failure'); END",
		tag = subject.replace(|c: char| !c.is_ascii_alphanumeric(), "_"),
		subject = subject.replace('\'', "''"),
	);
	sqlx::query(&sql).execute(pool).await.unwrap();
}

pub async fn insert_test_account(pool: &SqlitePool, email: &str, username: &str) -> Account {
	let account = Account {
		id: AccountId::generate(),
		external_subject_id: Some(format!("subject-{username}")),
		email: email.to_string(),
		username: username.to_string(),
		email_verified: true,
		photo_url: None,
		last_provider: ProviderTag::new(ProviderTag::PASSWORD).unwrap(),
		created_at: Utc::now(),
		last_authenticated_at: None,
		deleted_at: None,
	};

	sqlx::query(
		r#"
		INSERT INTO accounts (
			id, external_subject_id, email, username, email_verified,
			photo_url, last_provider, created_at
		) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
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
	.execute(pool)
	.await
	.unwrap();

	account
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
	let sql = format!("SELECT COUNT(*) FROM {table}");
	let row: (i64,) = sqlx::query_as(&sql).fetch_one(pool).await.unwrap();
	row.0
}
