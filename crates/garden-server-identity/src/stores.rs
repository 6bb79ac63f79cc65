// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use garden_server_db::{
	AccountRepository, AccountStore, BootstrapRepository, BootstrapStore, LinkedIdentityRepository,
	LinkedIdentityStore, SessionRepository, SessionStore, WorkspaceRepository, WorkspaceStore,
};
use sqlx::SqlitePool;

/// Store handles the identity service is constructed with.
#[derive(Clone)]
pub struct IdentityStores {
	pub accounts: Arc<dyn AccountStore>,
	pub identities: Arc<dyn LinkedIdentityStore>,
	pub workspaces: Arc<dyn WorkspaceStore>,
	pub sessions: Arc<dyn SessionStore>,
	pub bootstrap: Arc<dyn BootstrapStore>,
}

impl IdentityStores {
	/// All stores backed by the same SQLite pool.
	pub fn sqlite(pool: SqlitePool) -> Self {
		Self {
			accounts: Arc::new(AccountRepository::new(pool.clone())),
			identities: Arc::new(LinkedIdentityRepository::new(pool.clone())),
			workspaces: Arc::new(WorkspaceRepository::new(pool.clone())),
			sessions: Arc::new(SessionRepository::new(pool.clone())),
			bootstrap: Arc::new(BootstrapRepository::new(pool)),
		}
	}
}
