// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use garden_server_auth::AuthError;
use garden_server_db::DbError;

/// Errors surfaced by the identity resolution service.
///
/// `Display` carries internal context for diagnostics. Use
/// [`IdentityError::public_message`] for anything returned across the trust
/// boundary.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	#[error("not found: {0}")]
	NotFound(String),

	#[error("session already revoked")]
	AlreadyRevoked,

	#[error("conflict: {0}")]
	Conflict(String),

	/// The account bootstrap transaction failed and was rolled back.
	#[error("account bootstrap rolled back: {0}")]
	Transaction(#[source] DbError),

	#[error("database error: {0}")]
	Database(#[source] DbError),

	#[error("operation cancelled")]
	Cancelled,

	#[error("deadline of {0:?} exceeded")]
	DeadlineExceeded(Duration),
}

impl IdentityError {
	/// Wraps a failure of the bootstrap transaction. Constraint violations
	/// stay distinguishable as [`IdentityError::Conflict`].
	pub(crate) fn from_bootstrap(e: DbError) -> Self {
		match e {
			DbError::Conflict(msg) => IdentityError::Conflict(msg),
			other => IdentityError::Transaction(other),
		}
	}

	pub fn is_conflict(&self) -> bool {
		matches!(self, IdentityError::Conflict(_))
	}

	/// Generic text safe to show a caller. Never contains emails, subject
	/// ids or internal identifiers.
	pub fn public_message(&self) -> &'static str {
		match self {
			IdentityError::InvalidArgument(_) => "invalid request",
			IdentityError::NotFound(_) => "not found",
			IdentityError::AlreadyRevoked => "session already revoked",
			IdentityError::Conflict(_) => "conflicting account state",
			IdentityError::Transaction(_) | IdentityError::Database(_) => "authentication failed",
			IdentityError::Cancelled => "request cancelled",
			IdentityError::DeadlineExceeded(_) => "request timed out",
		}
	}
}

impl From<DbError> for IdentityError {
	fn from(e: DbError) -> Self {
		match e {
			DbError::Conflict(msg) => IdentityError::Conflict(msg),
			DbError::NotFound(what) => IdentityError::NotFound(what),
			other => IdentityError::Database(other),
		}
	}
}

impl From<AuthError> for IdentityError {
	fn from(e: AuthError) -> Self {
		IdentityError::InvalidArgument(e.to_string())
	}
}

pub type Result<T> = std::result::Result<T, IdentityError>;
