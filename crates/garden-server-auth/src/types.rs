// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions shared by the identity subsystem.
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs ([`AccountId`], [`SessionId`],
//!   [`WorkspaceId`], [`LinkedIdentityId`]) preventing accidental mixing
//! - **Workspace roles**: The closed, privilege-ordered [`WorkspaceRole`] set
//! - **Provider tags**: The open-ended [`ProviderTag`] naming the identity provider
//!   that vouched for a sign-in
//!
//! All ID types implement transparent serde serialization (as UUID strings) and
//! provide conversion to/from [`uuid::Uuid`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AuthError;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			pub fn into_inner(self) -> Uuid {
				self.0
			}

			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s).map(Self)
			}
		}
	};
}

define_id_type!(AccountId, "Unique identifier for an account.");
define_id_type!(LinkedIdentityId, "Unique identifier for a linked identity.");
define_id_type!(WorkspaceId, "Unique identifier for a workspace.");
define_id_type!(SessionId, "Unique identifier for a session.");

// =============================================================================
// Workspace Roles
// =============================================================================

/// Roles within a workspace, ordered by privilege: admin > member > viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceRole {
	/// Manages the workspace and its roster. Every workspace has at least one.
	Admin,
	/// Standard collaborator.
	Member,
	/// Read-only participant.
	Viewer,
}

impl WorkspaceRole {
	pub fn all() -> &'static [WorkspaceRole] {
		&[
			WorkspaceRole::Admin,
			WorkspaceRole::Member,
			WorkspaceRole::Viewer,
		]
	}

	fn rank(&self) -> u8 {
		match self {
			WorkspaceRole::Admin => 3,
			WorkspaceRole::Member => 2,
			WorkspaceRole::Viewer => 1,
		}
	}

	/// Returns true if this role has at least the permissions of the given role.
	pub fn has_permission_of(&self, other: &WorkspaceRole) -> bool {
		self.rank() >= other.rank()
	}
}

impl PartialOrd for WorkspaceRole {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for WorkspaceRole {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.rank().cmp(&other.rank())
	}
}

impl fmt::Display for WorkspaceRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			WorkspaceRole::Admin => write!(f, "admin"),
			WorkspaceRole::Member => write!(f, "member"),
			WorkspaceRole::Viewer => write!(f, "viewer"),
		}
	}
}

impl FromStr for WorkspaceRole {
	type Err = AuthError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"admin" => Ok(WorkspaceRole::Admin),
			"member" => Ok(WorkspaceRole::Member),
			"viewer" => Ok(WorkspaceRole::Viewer),
			other => Err(AuthError::InvalidRole(other.to_string())),
		}
	}
}

// =============================================================================
// Provider Tags
// =============================================================================

/// Identifies which external identity system vouched for a sign-in.
///
/// The set is open-ended: any non-empty string is accepted. The constants
/// below name the tags seen in practice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderTag(String);

impl ProviderTag {
	/// Email/password pseudo-provider.
	pub const PASSWORD: &'static str = "password";
	pub const GOOGLE: &'static str = "google.com";
	pub const FACEBOOK: &'static str = "facebook.com";
	pub const APPLE: &'static str = "apple.com";

	pub fn new(tag: impl Into<String>) -> Result<Self, AuthError> {
		let tag = tag.into();
		if tag.trim().is_empty() {
			return Err(AuthError::EmptyProviderTag);
		}
		Ok(Self(tag))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_password(&self) -> bool {
		self.0 == Self::PASSWORD
	}
}

impl fmt::Display for ProviderTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl TryFrom<String> for ProviderTag {
	type Error = AuthError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}

impl From<ProviderTag> for String {
	fn from(tag: ProviderTag) -> Self {
		tag.0
	}
}
