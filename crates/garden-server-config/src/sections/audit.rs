// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit trail configuration section.
//!
//! Identity operations hand their audit events to an in-process queue that a
//! background task drains into the sinks. These settings size that queue and
//! decide what is recorded. None of them can change the outcome of a login,
//! logout or revocation.
//!
//! ```toml
//! [audit]
//! enabled = true
//! queue_capacity = 4096
//! queue_overflow_policy = "drop_newest"
//! min_severity = "info"
//! ```

use serde::{Deserialize, Serialize};

const DEFAULT_QUEUE_CAPACITY: usize = 4096;
const DEFAULT_MIN_SEVERITY: &str = "info";

/// Behaviour of the audit queue once `queue_capacity` events are waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueOverflowPolicy {
	/// The new event is discarded and a warning is logged.
	#[default]
	DropNewest,
	/// The event waits on a detached task for queue space. The identity
	/// operation that emitted it still returns immediately.
	Block,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuditConfigLayer {
	pub enabled: Option<bool>,
	pub queue_capacity: Option<usize>,
	pub queue_overflow_policy: Option<QueueOverflowPolicy>,
	pub min_severity: Option<String>,
}

impl AuditConfigLayer {
	pub fn merge(&mut self, other: Self) {
		let AuditConfigLayer {
			enabled,
			queue_capacity,
			queue_overflow_policy,
			min_severity,
		} = other;

		self.enabled = enabled.or(self.enabled);
		self.queue_capacity = queue_capacity.or(self.queue_capacity);
		self.queue_overflow_policy = queue_overflow_policy.or(self.queue_overflow_policy);
		self.min_severity = min_severity.or(self.min_severity.take());
	}

	pub fn finalize(self) -> AuditConfig {
		let defaults = AuditConfig::default();
		AuditConfig {
			enabled: self.enabled.unwrap_or(defaults.enabled),
			queue_capacity: self.queue_capacity.unwrap_or(defaults.queue_capacity),
			queue_overflow_policy: self
				.queue_overflow_policy
				.unwrap_or(defaults.queue_overflow_policy),
			min_severity: self.min_severity.unwrap_or(defaults.min_severity),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditConfig {
	/// When false the pipeline still accepts events but has no sinks, so
	/// nothing is persisted.
	pub enabled: bool,
	/// Events that may wait for the background writer. Must be positive.
	pub queue_capacity: usize,
	pub queue_overflow_policy: QueueOverflowPolicy,
	/// Lowest severity that reaches the sinks: `debug`, `info`, `notice`,
	/// `warning` or `error`. Parsed when the pipeline is built, so
	/// an unknown name fails startup rather than silently recording nothing.
	pub min_severity: String,
}

impl Default for AuditConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			queue_capacity: DEFAULT_QUEUE_CAPACITY,
			queue_overflow_policy: QueueOverflowPolicy::DropNewest,
			min_severity: DEFAULT_MIN_SEVERITY.to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_layer_records_info_and_above() {
		let config = AuditConfigLayer::default().finalize();
		assert_eq!(config, AuditConfig::default());
		assert!(config.enabled);
		assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
		assert_eq!(config.min_severity, "info");
	}

	#[test]
	fn toml_selects_blocking_queue() {
		let layer: AuditConfigLayer = toml::from_str(
			r#"
			queue_capacity = 32
			queue_overflow_policy = "block"
			"#,
		)
		.unwrap();

		let config = layer.finalize();
		assert_eq!(config.queue_capacity, 32);
		assert_eq!(config.queue_overflow_policy, QueueOverflowPolicy::Block);
		assert_eq!(config.min_severity, "info");
	}

	#[test]
	fn unknown_overflow_policy_is_rejected() {
		let result: Result<AuditConfigLayer, _> =
			toml::from_str(r#"queue_overflow_policy = "drop_oldest""#);
		assert!(result.is_err());
	}

	#[test]
	fn later_layer_only_overrides_fields_it_sets() {
		let mut file = AuditConfigLayer {
			enabled: Some(true),
			min_severity: Some("warning".to_string()),
			..Default::default()
		};
		file.merge(AuditConfigLayer {
			enabled: Some(false),
			..Default::default()
		});

		let config = file.finalize();
		assert!(!config.enabled);
		assert_eq!(config.min_severity, "warning");
		assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
	}
}
