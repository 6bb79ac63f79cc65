// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::event::{AuditEventKind, AuditLogEntry, AuditSeverity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditFilterConfig {
	pub min_severity: AuditSeverity,
	pub include_events: Option<Vec<AuditEventKind>>,
	pub exclude_events: Option<Vec<AuditEventKind>>,
}

impl Default for AuditFilterConfig {
	fn default() -> Self {
		Self {
			min_severity: AuditSeverity::Info,
			include_events: None,
			exclude_events: None,
		}
	}
}

impl AuditFilterConfig {
	pub fn with_min_severity(min_severity: AuditSeverity) -> Self {
		Self {
			min_severity,
			..Default::default()
		}
	}

	pub fn allows(&self, entry: &AuditLogEntry) -> bool {
		if entry.severity < self.min_severity {
			return false;
		}

		if let Some(ref exclude) = self.exclude_events {
			if exclude.contains(&entry.event_kind) {
				return false;
			}
		}

		if let Some(ref include) = self.include_events {
			if !include.contains(&entry.event_kind) {
				return false;
			}
		}

		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn make_entry(kind: AuditEventKind, severity: AuditSeverity) -> AuditLogEntry {
		AuditLogEntry::builder(kind).severity(severity).build()
	}

	#[test]
	fn test_default_config_allows_info_and_above() {
		let config = AuditFilterConfig::default();

		assert!(config.allows(&make_entry(AuditEventKind::Login, AuditSeverity::Info)));
		assert!(config.allows(&make_entry(
			AuditEventKind::Registered,
			AuditSeverity::Warning
		)));
		assert!(!config.allows(&make_entry(AuditEventKind::Login, AuditSeverity::Debug)));
	}

	#[test]
	fn test_min_severity_filter() {
		let config = AuditFilterConfig::with_min_severity(AuditSeverity::Warning);

		assert!(!config.allows(&make_entry(AuditEventKind::Login, AuditSeverity::Info)));
		assert!(config.allows(&make_entry(
			AuditEventKind::Registered,
			AuditSeverity::Warning
		)));
		assert!(config.allows(&make_entry(AuditEventKind::Logout, AuditSeverity::Error)));
	}

	#[test]
	fn test_include_events_whitelist() {
		let config = AuditFilterConfig {
			include_events: Some(vec![AuditEventKind::Login, AuditEventKind::Logout]),
			..Default::default()
		};

		assert!(config.allows(&make_entry(AuditEventKind::Login, AuditSeverity::Info)));
		assert!(config.allows(&make_entry(AuditEventKind::Logout, AuditSeverity::Info)));
		assert!(!config.allows(&make_entry(
			AuditEventKind::AccountLinked,
			AuditSeverity::Info
		)));
	}

	#[test]
	fn test_exclude_events_blacklist() {
		let config = AuditFilterConfig {
			exclude_events: Some(vec![AuditEventKind::TokenRefresh]),
			..Default::default()
		};

		assert!(!config.allows(&make_entry(
			AuditEventKind::TokenRefresh,
			AuditSeverity::Info
		)));
		assert!(config.allows(&make_entry(AuditEventKind::Login, AuditSeverity::Info)));
	}
}
