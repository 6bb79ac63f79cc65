// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Column encoding shared by the repositories.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC text so that string
//! comparison in SQL orders them chronologically.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::DbError;

pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(column: &str, value: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

pub(crate) fn parse_opt_ts(
	column: &str,
	value: Option<String>,
) -> Result<Option<DateTime<Utc>>, DbError> {
	value.map(|v| parse_ts(column, &v)).transpose()
}

pub(crate) fn parse_id<T>(column: &str, value: &str) -> Result<T, DbError>
where
	T: FromStr<Err = uuid::Error>,
{
	T::from_str(value).map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

#[cfg(test)]
mod tests {
	use super::*;
	use garden_server_auth::AccountId;
	use proptest::prelude::*;

	#[test]
	fn format_is_fixed_width() {
		let a = DateTime::parse_from_rfc3339("2025-03-01T10:00:00Z")
			.unwrap()
			.with_timezone(&Utc);
		assert_eq!(format_ts(&a), "2025-03-01T10:00:00.000000Z");
	}

	#[test]
	fn parse_rejects_garbage() {
		assert!(matches!(
			parse_ts("created_at", "yesterday"),
			Err(DbError::Internal(_))
		));
		assert!(parse_id::<AccountId>("id", "nope").is_err());
	}

	proptest! {
		#[test]
		fn string_order_matches_time_order(a in 0i64..4_000_000_000_000_000, b in 0i64..4_000_000_000_000_000) {
			let ta = DateTime::<Utc>::from_timestamp_micros(a).unwrap();
			let tb = DateTime::<Utc>::from_timestamp_micros(b).unwrap();
			prop_assert_eq!(format_ts(&ta).cmp(&format_ts(&tb)), ta.cmp(&tb));
			prop_assert_eq!(parse_ts("t", &format_ts(&ta)).unwrap(), ta);
		}
	}
}
