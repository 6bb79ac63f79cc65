// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity resolution configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdentityConfigLayer {
	pub request_timeout_ms: Option<u64>,
}

impl IdentityConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.request_timeout_ms.is_some() {
			self.request_timeout_ms = other.request_timeout_ms;
		}
	}

	pub fn finalize(self) -> IdentityConfig {
		IdentityConfig {
			request_timeout_ms: self
				.request_timeout_ms
				.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityConfig {
	/// Upper bound on a single identity operation, including its transaction.
	pub request_timeout_ms: u64,
}

impl Default for IdentityConfig {
	fn default() -> Self {
		Self {
			request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
		}
	}
}

impl IdentityConfig {
	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}
}
