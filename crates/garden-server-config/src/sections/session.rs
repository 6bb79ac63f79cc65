// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session lifecycle configuration section.

use serde::{Deserialize, Serialize};

const DEFAULT_VALIDITY_DAYS: i64 = 30;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionConfigLayer {
	pub validity_days: Option<i64>,
	pub sweep_interval_secs: Option<u64>,
}

impl SessionConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.validity_days.is_some() {
			self.validity_days = other.validity_days;
		}
		if other.sweep_interval_secs.is_some() {
			self.sweep_interval_secs = other.sweep_interval_secs;
		}
	}

	pub fn finalize(self) -> SessionConfig {
		SessionConfig {
			validity_days: self.validity_days.unwrap_or(DEFAULT_VALIDITY_DAYS),
			sweep_interval_secs: self
				.sweep_interval_secs
				.unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
	/// Days between session creation and expiry.
	pub validity_days: i64,
	/// How often the expired-session sweeper runs.
	pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			validity_days: DEFAULT_VALIDITY_DAYS,
			sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
		}
	}
}

impl SessionConfig {
	pub fn validity(&self) -> chrono::Duration {
		chrono::Duration::days(self.validity_days)
	}

	pub fn sweep_interval(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.sweep_interval_secs)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = SessionConfigLayer::default().finalize();
		assert_eq!(config.validity_days, 30);
		assert_eq!(config.sweep_interval_secs, 3600);
		assert_eq!(config.validity(), chrono::Duration::days(30));
	}

	#[test]
	fn test_merge_overrides() {
		let mut base = SessionConfigLayer::default();
		base.merge(SessionConfigLayer {
			validity_days: Some(7),
			sweep_interval_secs: None,
		});
		let config = base.finalize();
		assert_eq!(config.validity_days, 7);
		assert_eq!(config.sweep_interval(), std::time::Duration::from_secs(3600));
	}
}
