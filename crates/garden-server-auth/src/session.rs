// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session lifecycle.
//!
//! A session is a time-bounded, revocable proof of an authenticated interaction.
//!
//! ```text
//! active ──(now >= expires_at)──▶ expired
//!    │
//!    └──(revoke)──▶ revoked
//! ```
//!
//! Both `expired` and `revoked` are terminal. Revocation wins over expiry when
//! reporting status. Sessions are immutable apart from the one-way transition
//! to revoked.
//!
//! # PII Considerations
//!
//! Sessions carry potentially identifying metadata:
//! - `ip_address`: origin network address
//! - `user_agent`: client identifier string
//! - `device_metadata`: caller-supplied device description

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::types::{AccountId, SessionId};

/// Fixed session validity window.
pub const SESSION_VALIDITY_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
	Active,
	Expired,
	Revoked,
}

impl SessionStatus {
	pub fn is_terminal(&self) -> bool {
		!matches!(self, SessionStatus::Active)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
	pub id: SessionId,
	pub account_id: AccountId,
	pub device_id: Option<String>,
	pub device_metadata: Option<serde_json::Value>,
	pub ip_address: Option<String>,
	pub user_agent: Option<String>,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
	pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
	/// Create a new session with the default 30-day validity window.
	#[instrument(level = "debug", skip(account_id), fields(account_id = %account_id))]
	pub fn new(account_id: AccountId) -> Self {
		Self::with_validity(account_id, Duration::days(SESSION_VALIDITY_DAYS))
	}

	pub fn with_validity(account_id: AccountId, validity: Duration) -> Self {
		let now = Utc::now();
		Self {
			id: SessionId::generate(),
			account_id,
			device_id: None,
			device_metadata: None,
			ip_address: None,
			user_agent: None,
			created_at: now,
			expires_at: now + validity,
			revoked_at: None,
		}
	}

	pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
		self.device_id = Some(device_id.into());
		self
	}

	pub fn with_device_metadata(mut self, metadata: serde_json::Value) -> Self {
		self.device_metadata = Some(metadata);
		self
	}

	pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
		self.ip_address = Some(ip.into());
		self
	}

	pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
		self.user_agent = Some(ua.into());
		self
	}

	/// Status at the given instant. Revocation takes precedence over expiry.
	pub fn status_at(&self, now: DateTime<Utc>) -> SessionStatus {
		if self.revoked_at.is_some() {
			SessionStatus::Revoked
		} else if now >= self.expires_at {
			SessionStatus::Expired
		} else {
			SessionStatus::Active
		}
	}

	pub fn status(&self) -> SessionStatus {
		self.status_at(Utc::now())
	}

	pub fn is_active(&self) -> bool {
		self.status() == SessionStatus::Active
	}

	pub fn is_expired(&self) -> bool {
		self.status() == SessionStatus::Expired
	}

	pub fn is_revoked(&self) -> bool {
		self.revoked_at.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	mod session_creation {
		use super::*;

		#[test]
		fn creates_session_for_account() {
			let account_id = AccountId::generate();
			let session = Session::new(account_id);

			assert_eq!(session.account_id, account_id);
			assert!(session.revoked_at.is_none());
			assert!(session.is_active());
		}

		#[test]
		fn creates_session_with_30_day_expiry() {
			let session = Session::new(AccountId::generate());

			let expected = session.created_at + Duration::days(SESSION_VALIDITY_DAYS);
			assert_eq!(session.expires_at, expected);
		}

		#[test]
		fn creates_session_with_unique_ids() {
			let account_id = AccountId::generate();
			assert_ne!(Session::new(account_id).id, Session::new(account_id).id);
		}

		#[test]
		fn builder_sets_optional_fields() {
			let session = Session::new(AccountId::generate())
				.with_device("pixel-8")
				.with_device_metadata(serde_json::json!({"os": "android"}))
				.with_ip("203.0.113.7")
				.with_user_agent("garden-android/2.1");

			assert_eq!(session.device_id.as_deref(), Some("pixel-8"));
			assert_eq!(session.ip_address.as_deref(), Some("203.0.113.7"));
			assert_eq!(session.user_agent.as_deref(), Some("garden-android/2.1"));
			assert!(session.device_metadata.is_some());
		}
	}

	mod session_status {
		use super::*;

		#[test]
		fn past_expiry_without_revocation_is_expired() {
			let mut session = Session::new(AccountId::generate());
			session.expires_at = Utc::now() - Duration::minutes(1);

			assert_eq!(session.status(), SessionStatus::Expired);
			assert!(!session.is_active());
			assert!(session.is_expired());
		}

		#[test]
		fn revoked_is_inactive_regardless_of_expiry() {
			let mut session = Session::new(AccountId::generate());
			session.revoked_at = Some(Utc::now());
			assert_eq!(session.status(), SessionStatus::Revoked);
			assert!(!session.is_active());

			session.expires_at = Utc::now() - Duration::days(1);
			assert_eq!(session.status(), SessionStatus::Revoked);
		}

		#[test]
		fn expiry_boundary_is_exclusive() {
			let session = Session::new(AccountId::generate());
			assert_eq!(session.status_at(session.expires_at), SessionStatus::Expired);
			assert_eq!(
				session.status_at(session.expires_at - Duration::seconds(1)),
				SessionStatus::Active
			);
		}

		#[test]
		fn terminal_states() {
			assert!(!SessionStatus::Active.is_terminal());
			assert!(SessionStatus::Expired.is_terminal());
			assert!(SessionStatus::Revoked.is_terminal());
		}
	}
}
