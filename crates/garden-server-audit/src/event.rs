// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit event model.
//!
//! Events are append-only. An [`AuditLogEntry`] is what callers hand to the
//! pipeline; the store assigns the monotonic id and returns [`AuditEvent`]
//! rows when queried.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use garden_server_auth::AccountId;
use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// The closed set of security-relevant event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
	Registered,
	Login,
	Logout,
	TokenRefresh,
	SessionRevoked,
	AccountDeleted,
	PasswordReset,
	AccountLinked,
}

impl AuditEventKind {
	pub fn all() -> &'static [AuditEventKind] {
		&[
			AuditEventKind::Registered,
			AuditEventKind::Login,
			AuditEventKind::Logout,
			AuditEventKind::TokenRefresh,
			AuditEventKind::SessionRevoked,
			AuditEventKind::AccountDeleted,
			AuditEventKind::PasswordReset,
			AuditEventKind::AccountLinked,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			AuditEventKind::Registered => "registered",
			AuditEventKind::Login => "login",
			AuditEventKind::Logout => "logout",
			AuditEventKind::TokenRefresh => "token_refresh",
			AuditEventKind::SessionRevoked => "session_revoked",
			AuditEventKind::AccountDeleted => "account_deleted",
			AuditEventKind::PasswordReset => "password_reset",
			AuditEventKind::AccountLinked => "account_linked",
		}
	}

	pub fn default_severity(&self) -> AuditSeverity {
		match self {
			AuditEventKind::AccountDeleted | AuditEventKind::PasswordReset => AuditSeverity::Notice,
			_ => AuditSeverity::Info,
		}
	}
}

impl fmt::Display for AuditEventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for AuditEventKind {
	type Err = AuditError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		AuditEventKind::all()
			.iter()
			.find(|kind| kind.as_str() == s)
			.copied()
			.ok_or_else(|| AuditError::ConfigError(format!("unknown audit event kind: {s}")))
	}
}

/// Severity levels for audit events, compatible with RFC 5424 syslog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
	Debug = 7,
	#[default]
	Info = 6,
	Notice = 5,
	Warning = 4,
	Error = 3,
}

impl PartialOrd for AuditSeverity {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for AuditSeverity {
	fn cmp(&self, other: &Self) -> Ordering {
		// Lower numeric value = higher severity
		(*other as u8).cmp(&(*self as u8))
	}
}

impl fmt::Display for AuditSeverity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditSeverity::Debug => "debug",
			AuditSeverity::Info => "info",
			AuditSeverity::Notice => "notice",
			AuditSeverity::Warning => "warning",
			AuditSeverity::Error => "error",
		};
		write!(f, "{s}")
	}
}

impl FromStr for AuditSeverity {
	type Err = AuditError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"debug" => Ok(AuditSeverity::Debug),
			"info" => Ok(AuditSeverity::Info),
			"notice" => Ok(AuditSeverity::Notice),
			"warning" | "warn" => Ok(AuditSeverity::Warning),
			"error" => Ok(AuditSeverity::Error),
			other => Err(AuditError::ConfigError(format!(
				"unknown audit severity: {other}"
			))),
		}
	}
}

/// An audit event as handed to the pipeline, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
	pub timestamp: DateTime<Utc>,
	pub event_kind: AuditEventKind,
	pub severity: AuditSeverity,
	pub success: bool,
	/// Absent for events that precede the account, e.g. a failed registration.
	pub account_id: Option<AccountId>,
	pub ip_address: Option<String>,
	pub user_agent: Option<String>,
	/// Free-form structured context (provider, device id, counts, error text).
	pub metadata: serde_json::Value,
}

impl AuditLogEntry {
	pub fn builder(event_kind: AuditEventKind) -> AuditLogBuilder {
		AuditLogBuilder::new(event_kind)
	}
}

/// A persisted audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
	/// Monotonic id assigned by the store.
	pub id: i64,
	#[serde(flatten)]
	pub entry: AuditLogEntry,
}

/// Builder for constructing audit log entries with a fluent API.
#[derive(Debug, Clone)]
pub struct AuditLogBuilder {
	event_kind: AuditEventKind,
	severity: Option<AuditSeverity>,
	success: bool,
	account_id: Option<AccountId>,
	ip_address: Option<String>,
	user_agent: Option<String>,
	metadata: serde_json::Value,
}

impl AuditLogBuilder {
	pub fn new(event_kind: AuditEventKind) -> Self {
		Self {
			event_kind,
			severity: None,
			success: true,
			account_id: None,
			ip_address: None,
			user_agent: None,
			metadata: serde_json::Value::Null,
		}
	}

	/// Set the severity level. Defaults from the event kind, raised to
	/// warning for failures.
	pub fn severity(mut self, severity: AuditSeverity) -> Self {
		self.severity = Some(severity);
		self
	}

	pub fn success(mut self, success: bool) -> Self {
		self.success = success;
		self
	}

	pub fn account(mut self, account_id: AccountId) -> Self {
		self.account_id = Some(account_id);
		self
	}

	pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
		self.ip_address = Some(ip.into());
		self
	}

	/// Sets the origin address when one is known.
	pub fn maybe_ip_address(mut self, ip: Option<&str>) -> Self {
		self.ip_address = ip.map(str::to_string);
		self
	}

	pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
		self.user_agent = Some(ua.into());
		self
	}

	pub fn maybe_user_agent(mut self, ua: Option<&str>) -> Self {
		self.user_agent = ua.map(str::to_string);
		self
	}

	pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
		self.metadata = metadata;
		self
	}

	pub fn build(self) -> AuditLogEntry {
		let severity = self.severity.unwrap_or_else(|| {
			if self.success {
				self.event_kind.default_severity()
			} else {
				AuditSeverity::Warning
			}
		});

		AuditLogEntry {
			timestamp: Utc::now(),
			event_kind: self.event_kind,
			severity,
			success: self.success,
			account_id: self.account_id,
			ip_address: self.ip_address,
			user_agent: self.user_agent,
			metadata: self.metadata,
		}
	}
}
