// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity domain types for Garden.
//!
//! This crate provides:
//! - Typed identifiers for accounts, linked identities, workspaces and sessions
//! - Account and linked-identity records, plus username derivation
//! - Workspaces, memberships and the privilege-ordered [`WorkspaceRole`]
//! - Sessions and their [`SessionStatus`] lifecycle
//!
//! Nothing here performs I/O. Persistence lives in `garden-server-db` and the
//! authentication workflow in `garden-server-identity`.

pub mod account;
pub mod error;
pub mod session;
pub mod types;
pub mod workspace;

pub use account::{
	username_base, username_with_suffix, validate_email, Account, LinkedIdentity, NewAccount,
	USERNAME_FALLBACK_SUFFIX_LEN, USERNAME_RETRY_LIMIT, USERNAME_SUFFIX_LEN,
};
pub use error::AuthError;
pub use session::{Session, SessionStatus, SESSION_VALIDITY_DAYS};
pub use types::{AccountId, LinkedIdentityId, ProviderTag, SessionId, WorkspaceId, WorkspaceRole};
pub use workspace::{default_workspace_name, Workspace, WorkspaceMembership};
