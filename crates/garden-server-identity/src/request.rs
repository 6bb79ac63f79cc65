// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use garden_server_auth::{
	validate_email, Account, AccountId, AuthError, NewAccount, ProviderTag, SessionId, Workspace,
};
use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// A verified identity assertion handed over by the token issuer.
///
/// The issuer has already checked the assertion; this service trusts the
/// tuple as given.
#[derive(Debug, Clone)]
pub struct AuthenticationRequest {
	pub external_subject_id: String,
	pub email: String,
	pub provider: ProviderTag,
	pub email_verified: bool,
	pub photo_url: Option<String>,
	pub device_id: Option<String>,
	pub device_metadata: Option<serde_json::Value>,
	pub ip_address: Option<String>,
	pub user_agent: Option<String>,
}

impl AuthenticationRequest {
	pub fn new(
		external_subject_id: impl Into<String>,
		email: impl Into<String>,
		provider: ProviderTag,
	) -> Self {
		Self {
			external_subject_id: external_subject_id.into(),
			email: email.into(),
			provider,
			email_verified: false,
			photo_url: None,
			device_id: None,
			device_metadata: None,
			ip_address: None,
			user_agent: None,
		}
	}

	pub fn email_verified(mut self, verified: bool) -> Self {
		self.email_verified = verified;
		self
	}

	pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
		self.photo_url = Some(url.into());
		self
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

	pub(crate) fn validate(&self) -> Result<(), AuthError> {
		if self.external_subject_id.trim().is_empty() {
			return Err(AuthError::EmptySubjectId);
		}
		validate_email(&self.email)
	}

	pub(crate) fn new_account(&self) -> NewAccount {
		NewAccount {
			external_subject_id: self.external_subject_id.clone(),
			email: self.email.clone(),
			provider: self.provider.clone(),
			email_verified: self.email_verified,
			photo_url: self.photo_url.clone(),
		}
	}
}

/// Outcome of a successful authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationResult {
	pub account: Account,
	/// Every workspace the account belongs to, newest first.
	pub workspaces: Vec<Workspace>,
	pub session_id: SessionId,
	pub is_new_account: bool,
}

/// Which sessions a logout revokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutMode {
	Device(String),
	All,
}

impl LogoutMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			LogoutMode::Device(_) => "device",
			LogoutMode::All => "all",
		}
	}
}

#[derive(Debug, Clone)]
pub struct LogoutRequest {
	pub account_id: AccountId,
	pub device_id: Option<String>,
	pub revoke_all: bool,
}

impl LogoutRequest {
	pub fn device(account_id: AccountId, device_id: impl Into<String>) -> Self {
		Self {
			account_id,
			device_id: Some(device_id.into()),
			revoke_all: false,
		}
	}

	pub fn all(account_id: AccountId) -> Self {
		Self {
			account_id,
			device_id: None,
			revoke_all: true,
		}
	}

	/// Exactly one of `device_id` and `revoke_all` must be set.
	pub fn mode(&self) -> Result<LogoutMode, IdentityError> {
		match (&self.device_id, self.revoke_all) {
			(None, true) => Ok(LogoutMode::All),
			(Some(device), false) if !device.is_empty() => Ok(LogoutMode::Device(device.clone())),
			(Some(_), true) => Err(IdentityError::InvalidArgument(
				"logout takes either a device id or revoke_all, not both".to_string(),
			)),
			_ => Err(IdentityError::InvalidArgument(
				"logout requires a device id or revoke_all".to_string(),
			)),
		}
	}
}
