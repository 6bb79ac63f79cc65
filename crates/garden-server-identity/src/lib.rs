// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity resolution for Garden.
//!
//! Turns a verified identity assertion into an account, a default workspace
//! and a session through one of three paths:
//! - existing account (known subject id)
//! - cross-provider linking (known email, new provider)
//! - new account (transactional bootstrap)
//!
//! Also handles logout, individual session revocation, account deletion and
//! the background sweep of expired sessions.

mod error;
mod request;
mod service;
mod stores;
mod sweeper;

pub use error::{IdentityError, Result};
pub use request::{AuthenticationRequest, AuthenticationResult, LogoutMode, LogoutRequest};
pub use service::IdentityResolutionService;
pub use stores::IdentityStores;
pub use sweeper::spawn_session_sweeper;
