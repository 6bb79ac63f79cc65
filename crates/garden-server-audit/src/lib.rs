// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit trail for the Garden identity subsystem.
//!
//! Audit emission is a side effect, never a gate: [`AuditService::log`] queues
//! an entry and returns immediately, and sink failures surface only in the
//! service's own tracing output.

pub mod error;
pub mod event;
pub mod filter;
pub mod pipeline;
pub mod sink;

pub use error::{AuditError, AuditResult, AuditSinkError};
pub use event::{AuditEvent, AuditEventKind, AuditLogBuilder, AuditLogEntry, AuditSeverity};
pub use filter::AuditFilterConfig;
pub use pipeline::AuditService;
pub use sink::AuditSink;

pub use garden_server_config::{AuditConfig, QueueOverflowPolicy};

#[cfg(feature = "sink-sqlite")]
pub use sink::sqlite::SqliteAuditSink;

#[cfg(feature = "sink-tracing")]
pub use sink::tracing::TracingAuditSink;
