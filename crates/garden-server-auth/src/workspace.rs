// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Workspace and membership types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AccountId, WorkspaceId, WorkspaceRole};

/// A collaborative container owned by one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
	pub id: WorkspaceId,
	pub owner_id: AccountId,
	pub name: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Workspace {
	/// Builds the default workspace created alongside a new account.
	pub fn default_for(owner_id: AccountId, username: &str) -> Self {
		let now = Utc::now();
		Self {
			id: WorkspaceId::generate(),
			owner_id,
			name: default_workspace_name(username),
			created_at: now,
			updated_at: now,
		}
	}
}

/// Junction row between a workspace and an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceMembership {
	pub workspace_id: WorkspaceId,
	pub account_id: AccountId,
	pub role: WorkspaceRole,
	pub joined_at: DateTime<Utc>,
}

pub fn default_workspace_name(username: &str) -> String {
	format!("{username}'s Garden")
}
