// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Primary result codes for a held lock. Extended codes such as
/// `SQLITE_BUSY_SNAPSHOT` (517) carry the primary code in the low byte.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

impl DbError {
	/// Classifies a write error. Unique-constraint violations and lock
	/// contention with another writer both become [`DbError::Conflict`]; the
	/// message names the constraint, never the value.
	pub fn from_write(e: sqlx::Error) -> Self {
		match &e {
			sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
				DbError::Conflict(db_err.message().to_string())
			}
			sqlx::Error::Database(db_err) if is_lock_contention(db_err.as_ref()) => {
				tracing::debug!(code = ?db_err.code(), "write lost to a concurrent writer");
				DbError::Conflict("database busy".to_string())
			}
			_ => DbError::Sqlx(e),
		}
	}

	pub fn is_conflict(&self) -> bool {
		matches!(self, DbError::Conflict(_))
	}
}

fn is_lock_contention(db_err: &dyn sqlx::error::DatabaseError) -> bool {
	db_err
		.code()
		.and_then(|code| code.parse::<i32>().ok())
		.is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

pub type Result<T> = std::result::Result<T, DbError>;
