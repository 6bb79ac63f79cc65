// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Account and linked-identity types.
//!
//! This module provides:
//! - [`Account`] - durable identity record with soft-delete
//! - [`LinkedIdentity`] - maps one provider's subject id to an account
//! - [`NewAccount`] - the verified tuple used to bootstrap a fresh account
//! - username derivation helpers used by the allocator

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::types::{AccountId, LinkedIdentityId, ProviderTag};

/// Number of suffixed candidates tried after the base username collides.
pub const USERNAME_RETRY_LIMIT: usize = 5;

/// Length of the random suffix used for each retry.
pub const USERNAME_SUFFIX_LEN: usize = 8;

/// Length of the random suffix used once every retry has collided.
pub const USERNAME_FALLBACK_SUFFIX_LEN: usize = 12;

/// Used when the email has an empty local part.
const EMPTY_USERNAME_BASE: &str = "user";

/// A durable identity record a human authenticates into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
	pub id: AccountId,
	/// Subject id of the first provider that authenticated this account.
	pub external_subject_id: Option<String>,
	pub email: String,
	pub username: String,
	pub email_verified: bool,
	pub photo_url: Option<String>,
	pub last_provider: ProviderTag,
	pub created_at: DateTime<Utc>,
	pub last_authenticated_at: Option<DateTime<Utc>>,
	pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
	pub fn is_deleted(&self) -> bool {
		self.deleted_at.is_some()
	}
}

/// A mapping from one external provider's subject id to an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedIdentity {
	pub id: LinkedIdentityId,
	pub account_id: AccountId,
	pub provider: ProviderTag,
	pub external_subject_id: String,
	pub created_at: DateTime<Utc>,
}

impl LinkedIdentity {
	pub fn new(
		account_id: AccountId,
		provider: ProviderTag,
		external_subject_id: impl Into<String>,
	) -> Self {
		Self {
			id: LinkedIdentityId::generate(),
			account_id,
			provider,
			external_subject_id: external_subject_id.into(),
			created_at: Utc::now(),
		}
	}
}

/// Verified input for the new-account path.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
	pub external_subject_id: String,
	pub email: String,
	pub provider: ProviderTag,
	pub email_verified: bool,
	pub photo_url: Option<String>,
}

impl NewAccount {
	pub fn username_base(&self) -> String {
		username_base(&self.email)
	}
}

/// Checks the shape of an email closely enough to derive a username from it.
pub fn validate_email(email: &str) -> Result<(), AuthError> {
	match email.split_once('@') {
		Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
		_ => Err(AuthError::InvalidEmail),
	}
}

/// Derives the base username candidate from an email address.
///
/// Takes the local part (before `@`) and replaces `.`, `+` and `-` with `_`.
pub fn username_base(email: &str) -> String {
	let local = email.split('@').next().unwrap_or_default();

	let base: String = local
		.chars()
		.map(|c| match c {
			'.' | '+' | '-' => '_',
			c => c,
		})
		.collect();

	if base.is_empty() {
		EMPTY_USERNAME_BASE.to_string()
	} else {
		base
	}
}

/// Appends a random lowercase alphanumeric suffix of `len` characters to `base`.
pub fn username_with_suffix(base: &str, len: usize) -> String {
	let suffix: String = rand::thread_rng()
		.sample_iter(&Alphanumeric)
		.take(len)
		.map(|b| (b as char).to_ascii_lowercase())
		.collect();
	format!("{base}_{suffix}")
}
