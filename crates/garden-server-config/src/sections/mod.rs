// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for garden-server.

pub mod audit;
pub mod database;
pub mod identity;
pub mod logging;
pub mod session;

pub use audit::{AuditConfig, AuditConfigLayer, QueueOverflowPolicy};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use identity::{IdentityConfig, IdentityConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use session::{SessionConfig, SessionConfigLayer};
