// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read side of the audit trail. Rows are appended by the audit pipeline's
//! SQLite sink and never modified here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use garden_server_audit::{AuditEvent, AuditEventKind, AuditLogEntry, AuditSeverity};
use garden_server_auth::AccountId;
use sqlx::{
	sqlite::{SqlitePool, SqliteRow},
	Row,
};

use crate::convert::{format_ts, parse_id, parse_ts};
use crate::error::{DbError, Result};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 1000;

/// Filter for [`AuditRepository::query_events`]. Time bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
	pub account_id: Option<AccountId>,
	pub event_kind: Option<AuditEventKind>,
	pub from: Option<DateTime<Utc>>,
	pub to: Option<DateTime<Utc>>,
	pub limit: Option<i64>,
	pub offset: Option<i64>,
}

#[async_trait]
pub trait AuditStore: Send + Sync {
	async fn query_events(&self, query: &AuditQuery) -> Result<(Vec<AuditEvent>, i64)>;
	async fn list_events_for_account(
		&self,
		account_id: &AccountId,
		from: DateTime<Utc>,
		to: DateTime<Utc>,
		limit: i64,
	) -> Result<Vec<AuditEvent>>;
	async fn count_events(&self, account_id: Option<&AccountId>) -> Result<i64>;
}

pub struct AuditRepository {
	pool: SqlitePool,
}

impl AuditRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Returns one page of matching events in id order, plus the total match count.
	#[tracing::instrument(skip(self))]
	pub async fn query_events(&self, query: &AuditQuery) -> Result<(Vec<AuditEvent>, i64)> {
		let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(0, MAX_LIMIT);
		let offset = query.offset.unwrap_or(0).max(0);

		let mut conditions = vec!["1=1"];
		let mut binds: Vec<String> = Vec::new();
		if let Some(account_id) = &query.account_id {
			conditions.push("account_id = ?");
			binds.push(account_id.to_string());
		}
		if let Some(kind) = query.event_kind {
			conditions.push("event_kind = ?");
			binds.push(kind.as_str().to_string());
		}
		if let Some(from) = &query.from {
			conditions.push("created_at >= ?");
			binds.push(format_ts(from));
		}
		if let Some(to) = &query.to {
			conditions.push("created_at <= ?");
			binds.push(format_ts(to));
		}
		let where_clause = conditions.join(" AND ");

		let count_sql = format!("SELECT COUNT(*) as cnt FROM audit_events WHERE {where_clause}");
		let mut count_query = sqlx::query(&count_sql);
		for v in &binds {
			count_query = count_query.bind(v);
		}
		let total: i64 = count_query.fetch_one(&self.pool).await?.get("cnt");

		let data_sql = format!(
			"SELECT id, account_id, event_kind, severity, success, ip_address, user_agent, \
			 metadata, created_at \
			 FROM audit_events WHERE {where_clause} ORDER BY id ASC LIMIT ? OFFSET ?"
		);
		let mut data_query = sqlx::query(&data_sql);
		for v in &binds {
			data_query = data_query.bind(v);
		}
		let rows = data_query
			.bind(limit)
			.bind(offset)
			.fetch_all(&self.pool)
			.await?;

		let events = rows.iter().map(row_to_event).collect::<Result<Vec<_>>>()?;
		Ok((events, total))
	}

	#[tracing::instrument(skip(self), fields(account_id = %account_id))]
	pub async fn list_events_for_account(
		&self,
		account_id: &AccountId,
		from: DateTime<Utc>,
		to: DateTime<Utc>,
		limit: i64,
	) -> Result<Vec<AuditEvent>> {
		let query = AuditQuery {
			account_id: Some(*account_id),
			from: Some(from),
			to: Some(to),
			limit: Some(limit),
			..Default::default()
		};
		let (events, _) = self.query_events(&query).await?;
		Ok(events)
	}

	#[tracing::instrument(skip(self))]
	pub async fn count_events(&self, account_id: Option<&AccountId>) -> Result<i64> {
		let count: (i64,) = match account_id {
			Some(id) => {
				sqlx::query_as("SELECT COUNT(*) FROM audit_events WHERE account_id = ?")
					.bind(id.to_string())
					.fetch_one(&self.pool)
					.await?
			}
			None => {
				sqlx::query_as("SELECT COUNT(*) FROM audit_events")
					.fetch_one(&self.pool)
					.await?
			}
		};
		Ok(count.0)
	}
}

#[async_trait]
impl AuditStore for AuditRepository {
	async fn query_events(&self, query: &AuditQuery) -> Result<(Vec<AuditEvent>, i64)> {
		self.query_events(query).await
	}

	async fn list_events_for_account(
		&self,
		account_id: &AccountId,
		from: DateTime<Utc>,
		to: DateTime<Utc>,
		limit: i64,
	) -> Result<Vec<AuditEvent>> {
		self
			.list_events_for_account(account_id, from, to, limit)
			.await
	}

	async fn count_events(&self, account_id: Option<&AccountId>) -> Result<i64> {
		self.count_events(account_id).await
	}
}

fn row_to_event(row: &SqliteRow) -> Result<AuditEvent> {
	let account_id: Option<String> = row.get("account_id");
	let kind: String = row.get("event_kind");
	let severity: String = row.get("severity");
	let success: i32 = row.get("success");
	let metadata: String = row.get("metadata");
	let created_at: String = row.get("created_at");

	Ok(AuditEvent {
		id: row.get("id"),
		entry: AuditLogEntry {
			timestamp: parse_ts("created_at", &created_at)?,
			event_kind: kind
				.parse()
				.map_err(|_| DbError::Internal(format!("Unknown audit event kind: {kind}")))?,
			severity: severity
				.parse::<AuditSeverity>()
				.map_err(|_| DbError::Internal(format!("Unknown audit severity: {severity}")))?,
			success: success != 0,
			account_id: account_id
				.map(|id| parse_id("account_id", &id))
				.transpose()?,
			ip_address: row.get("ip_address"),
			user_agent: row.get("user_agent"),
			metadata: serde_json::from_str(&metadata)?,
		},
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_identity_test_pool;
	use chrono::Duration;
	use garden_server_audit::{AuditFilterConfig, AuditSink, SqliteAuditSink};
	use std::sync::Arc;

	async fn append(sink: &SqliteAuditSink, entry: AuditLogEntry) {
		sink.publish(Arc::new(entry)).await.unwrap();
	}

	#[tokio::test]
	async fn empty_store() {
		let pool = create_identity_test_pool().await;
		let repo = AuditRepository::new(pool);

		let (events, total) = repo.query_events(&AuditQuery::default()).await.unwrap();
		assert!(events.is_empty());
		assert_eq!(total, 0);
		assert_eq!(repo.count_events(None).await.unwrap(), 0);
	}

	#[tokio::test]
	async fn lists_account_events_in_id_order_within_range() {
		let pool = create_identity_test_pool().await;
		let sink = SqliteAuditSink::new(pool.clone(), AuditFilterConfig::default());
		let repo = AuditRepository::new(pool);
		let alice = AccountId::generate();
		let bob = AccountId::generate();
		let now = Utc::now();

		let mut old = AuditLogEntry::builder(AuditEventKind::Login)
			.account(alice)
			.build();
		old.timestamp = now - Duration::days(10);
		append(&sink, old).await;

		append(
			&sink,
			AuditLogEntry::builder(AuditEventKind::Registered)
				.account(alice)
				.metadata(serde_json::json!({"provider": "google.com"}))
				.build(),
		)
		.await;
		append(
			&sink,
			AuditLogEntry::builder(AuditEventKind::Logout)
				.account(alice)
				.ip_address("203.0.113.7")
				.build(),
		)
		.await;
		append(
			&sink,
			AuditLogEntry::builder(AuditEventKind::Login)
				.account(bob)
				.build(),
		)
		.await;

		let events = repo
			.list_events_for_account(&alice, now - Duration::days(1), now + Duration::days(1), 10)
			.await
			.unwrap();
		let kinds: Vec<_> = events.iter().map(|e| e.entry.event_kind).collect();
		assert_eq!(kinds, vec![AuditEventKind::Registered, AuditEventKind::Logout]);
		assert!(events[0].id < events[1].id);
		assert_eq!(events[0].entry.metadata["provider"], "google.com");
		assert_eq!(events[1].entry.ip_address.as_deref(), Some("203.0.113.7"));

		assert_eq!(repo.count_events(Some(&alice)).await.unwrap(), 3);
		assert_eq!(repo.count_events(None).await.unwrap(), 4);
	}

	#[tokio::test]
	async fn events_without_account_are_kept() {
		let pool = create_identity_test_pool().await;
		let sink = SqliteAuditSink::new(pool.clone(), AuditFilterConfig::default());
		let repo = AuditRepository::new(pool);

		append(
			&sink,
			AuditLogEntry::builder(AuditEventKind::Registered)
				.success(false)
				.metadata(serde_json::json!({"error": "boom"}))
				.build(),
		)
		.await;

		let (events, total) = repo
			.query_events(&AuditQuery {
				event_kind: Some(AuditEventKind::Registered),
				..Default::default()
			})
			.await
			.unwrap();
		assert_eq!(total, 1);
		assert!(events[0].entry.account_id.is_none());
		assert!(!events[0].entry.success);
		assert_eq!(events[0].entry.severity, AuditSeverity::Warning);
	}

	#[tokio::test]
	async fn paging_reports_total() {
		let pool = create_identity_test_pool().await;
		let sink = SqliteAuditSink::new(pool.clone(), AuditFilterConfig::default());
		let repo = AuditRepository::new(pool);
		let account = AccountId::generate();

		for _ in 0..5 {
			append(
				&sink,
				AuditLogEntry::builder(AuditEventKind::TokenRefresh)
					.account(account)
					.build(),
			)
			.await;
		}

		let (page, total) = repo
			.query_events(&AuditQuery {
				account_id: Some(account),
				limit: Some(2),
				offset: Some(2),
				..Default::default()
			})
			.await
			.unwrap();
		assert_eq!(total, 5);
		assert_eq!(page.len(), 2);
	}
}
