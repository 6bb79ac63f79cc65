// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! # garden-server-db
//!
//! Persistence for the Garden identity subsystem, using SQLite via sqlx.
//!
//! ## Repository Pattern
//!
//! Each entity has two components:
//! - **`*Store` trait**: the interface the identity service is constructed with
//! - **`*Repository` struct**: concrete implementation holding a `SqlitePool`
//!
//! Inherent methods carry the `#[tracing::instrument]` spans; trait impls
//! delegate to them. Emails and external subject ids are never span fields.
//!
//! ## Error Handling
//!
//! | Variant | When |
//! |---------|------|
//! | `NotFound` | An update addressed a row that must exist but doesn't |
//! | `Conflict` | Unique constraint violation (email, username, provider link) or a write lock held by another connection |
//! | `Sqlx` | Any other database error |
//! | `Internal` | Unparseable stored data |
//!
//! Lookups where absence is normal return `Result<Option<T>>`.
//!
//! ## Transactions
//!
//! [`BootstrapRepository`] writes the account, its default workspace, the
//! admin membership and the linked identity in a single transaction. The
//! connection-level helpers in each module take `&mut SqliteConnection` so they
//! run equally on a pooled connection or inside a transaction.
//!
//! ## Schema
//!
//! [`create_identity_schema`] creates every table idempotently on a fresh or
//! existing database.
//!
//! ## Testing
//!
//! The `testing` module (enabled under `cfg(test)` or the `test-utils`
//! feature) creates the identity schema on an in-memory pool.

pub mod account;
pub mod audit;
pub mod bootstrap;
mod convert;
mod error;
pub mod identity;
pub mod pool;
pub mod schema;
pub mod session;
pub mod workspace;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use account::{AccountRepository, AccountStore, LinkedLogin};
pub use audit::{AuditQuery, AuditRepository, AuditStore};
pub use bootstrap::{BootstrapRepository, BootstrapStore, BootstrappedAccount};
pub use error::{DbError, Result};
pub use identity::{LinkedIdentityRepository, LinkedIdentityStore};
pub use pool::create_pool;
pub use schema::create_identity_schema;
pub use session::{RevokeOutcome, SessionRepository, SessionStore};
pub use workspace::{WorkspaceRepository, WorkspaceStore};
