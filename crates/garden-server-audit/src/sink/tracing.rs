// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Level;

use super::{AuditSink, AuditSinkError};
use crate::event::{AuditLogEntry, AuditSeverity};
use crate::filter::AuditFilterConfig;

/// Mirrors audit events into the service's own log stream.
pub struct TracingAuditSink {
	filter: AuditFilterConfig,
}

impl TracingAuditSink {
	pub fn new(filter: AuditFilterConfig) -> Self {
		Self { filter }
	}
}

pub fn severity_to_level(severity: AuditSeverity) -> Level {
	match severity {
		AuditSeverity::Debug => Level::DEBUG,
		AuditSeverity::Info | AuditSeverity::Notice => Level::INFO,
		AuditSeverity::Warning => Level::WARN,
		AuditSeverity::Error => Level::ERROR,
	}
}

macro_rules! emit_audit {
	($level:expr, $($field:tt)*) => {
		match $level {
			Level::ERROR => tracing::error!(target: "garden_audit", $($field)*),
			Level::WARN => tracing::warn!(target: "garden_audit", $($field)*),
			Level::INFO => tracing::info!(target: "garden_audit", $($field)*),
			Level::DEBUG => tracing::debug!(target: "garden_audit", $($field)*),
			_ => tracing::trace!(target: "garden_audit", $($field)*),
		}
	};
}

#[async_trait]
impl AuditSink for TracingAuditSink {
	fn name(&self) -> &str {
		"tracing"
	}

	fn filter(&self) -> &AuditFilterConfig {
		&self.filter
	}

	async fn publish(&self, entry: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
		let level = severity_to_level(entry.severity);
		let event_kind = entry.event_kind.to_string();
		let account_id = entry.account_id.map(|id| id.to_string());
		let ip_address = entry.ip_address.as_deref();
		let user_agent = entry.user_agent.as_deref();
		let metadata = entry.metadata.to_string();

		emit_audit!(
			level,
			event_kind = %event_kind,
			success = entry.success,
			account_id = ?account_id,
			ip_address = ?ip_address,
			user_agent = ?user_agent,
			metadata = %metadata,
			"audit event"
		);

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::AuditEventKind;

	#[test]
	fn maps_severity_to_level() {
		assert_eq!(severity_to_level(AuditSeverity::Debug), Level::DEBUG);
		assert_eq!(severity_to_level(AuditSeverity::Notice), Level::INFO);
		assert_eq!(severity_to_level(AuditSeverity::Warning), Level::WARN);
		assert_eq!(severity_to_level(AuditSeverity::Error), Level::ERROR);
	}

	#[tokio::test]
	async fn publish_never_fails() {
		let sink = TracingAuditSink::new(AuditFilterConfig::default());
		let entry = AuditLogEntry::builder(AuditEventKind::Logout)
			.metadata(serde_json::json!({"mode": "device"}))
			.build();
		assert!(sink.publish(Arc::new(entry)).await.is_ok());
	}
}
