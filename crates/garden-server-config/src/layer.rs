// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	AuditConfigLayer, DatabaseConfigLayer, IdentityConfigLayer, LoggingConfigLayer,
	SessionConfigLayer,
};

/// Server configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub session: Option<SessionConfigLayer>,
	#[serde(default)]
	pub identity: Option<IdentityConfigLayer>,
	#[serde(default)]
	pub audit: Option<AuditConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_option(
			&mut self.database,
			other.database,
			DatabaseConfigLayer::merge,
		);
		merge_option(&mut self.session, other.session, SessionConfigLayer::merge);
		merge_option(
			&mut self.identity,
			other.identity,
			IdentityConfigLayer::merge,
		);
		merge_option(&mut self.audit, other.audit, AuditConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_merge_empty_layers() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer::default());
		assert!(base.database.is_none());
		assert!(base.session.is_none());
	}

	#[test]
	fn test_merge_preserves_base_when_other_empty() {
		let mut base = ServerConfigLayer {
			session: Some(SessionConfigLayer {
				validity_days: Some(14),
				sweep_interval_secs: None,
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer::default());
		assert_eq!(base.session.unwrap().validity_days, Some(14));
	}

	#[test]
	fn test_merge_fills_missing_section() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer {
			identity: Some(IdentityConfigLayer {
				request_timeout_ms: Some(250),
			}),
			..Default::default()
		});
		assert_eq!(base.identity.unwrap().request_timeout_ms, Some(250));
	}

	proptest! {
		#[test]
		fn later_layer_wins(first in 1i64..365, second in 1i64..365) {
			let layer = |days| ServerConfigLayer {
				session: Some(SessionConfigLayer {
					validity_days: Some(days),
					sweep_interval_secs: None,
				}),
				..Default::default()
			};
			let mut base = layer(first);
			base.merge(layer(second));
			prop_assert_eq!(base.session.unwrap().validity_days, Some(second));
		}
	}
}
