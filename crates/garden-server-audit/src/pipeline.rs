// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::str::FromStr;
use std::sync::Arc;

use garden_server_config::{AuditConfig, QueueOverflowPolicy};
use tokio::sync::mpsc::{self, error::SendError};
use tracing::{instrument, warn};

use crate::error::{AuditError, AuditResult};
use crate::event::{AuditLogEntry, AuditSeverity};
use crate::filter::AuditFilterConfig;
use crate::sink::AuditSink;

/// Fire-and-forget audit pipeline.
///
/// `log` never fails from the caller's point of view. Entries are queued on a
/// bounded channel and fanned out to every sink by a background task; sink
/// failures are logged and dropped.
pub struct AuditService {
	tx: mpsc::Sender<AuditLogEntry>,
	overflow_policy: QueueOverflowPolicy,
}

impl AuditService {
	pub fn new(
		global_filter: AuditFilterConfig,
		queue_capacity: usize,
		overflow_policy: QueueOverflowPolicy,
		sinks: Vec<Arc<dyn AuditSink>>,
	) -> Self {
		let (tx, rx) = mpsc::channel(queue_capacity.max(1));

		tokio::spawn(Self::background_task(rx, global_filter, sinks));

		Self {
			tx,
			overflow_policy,
		}
	}

	/// Builds the service from resolved configuration. A disabled audit
	/// config keeps the queue but drops every sink.
	pub fn from_config(config: &AuditConfig, sinks: Vec<Arc<dyn AuditSink>>) -> AuditResult<Self> {
		let min_severity = AuditSeverity::from_str(&config.min_severity)?;
		let sinks = if config.enabled { sinks } else { Vec::new() };

		Ok(Self::new(
			AuditFilterConfig::with_min_severity(min_severity),
			config.queue_capacity,
			config.queue_overflow_policy,
			sinks,
		))
	}

	async fn background_task(
		mut rx: mpsc::Receiver<AuditLogEntry>,
		global_filter: AuditFilterConfig,
		sinks: Vec<Arc<dyn AuditSink>>,
	) {
		while let Some(entry) = rx.recv().await {
			if !global_filter.allows(&entry) {
				continue;
			}

			let entry = Arc::new(entry);

			for sink in &sinks {
				if !sink.filter().allows(&entry) {
					continue;
				}

				let sink = Arc::clone(sink);
				let entry = Arc::clone(&entry);

				tokio::spawn(async move {
					if let Err(e) = sink.publish(entry).await {
						warn!(sink = sink.name(), error = %e, "audit sink publish failed");
					}
				});
			}
		}
	}

	/// Queue an audit event for processing.
	///
	/// Returns `true` if the event was queued, `false` if it was dropped.
	///
	/// - `Block`: spawns a task that waits for queue space; the caller never waits
	/// - `DropNewest`: drops the new event when the queue is full
	#[instrument(skip(self, entry), fields(event_kind = %entry.event_kind, success = entry.success))]
	pub fn log(&self, entry: AuditLogEntry) -> bool {
		match self.overflow_policy {
			QueueOverflowPolicy::Block => {
				let tx = self.tx.clone();
				tokio::spawn(async move {
					let _ = tx.send(entry).await;
				});
				true
			}
			QueueOverflowPolicy::DropNewest => {
				let queued = self.tx.try_send(entry).is_ok();
				if !queued {
					warn!("audit queue full, event dropped");
				}
				queued
			}
		}
	}

	pub async fn log_blocking(&self, entry: AuditLogEntry) -> Result<(), SendError<AuditLogEntry>> {
		self.tx.send(entry).await
	}

	/// Checks every sink, returning the first failure.
	pub async fn health_check(sinks: &[Arc<dyn AuditSink>]) -> AuditResult<()> {
		for sink in sinks {
			sink.health_check()
				.await
				.map_err(|source| AuditError::SinkError {
					sink: sink.name().to_string(),
					source,
				})?;
		}
		Ok(())
	}
}
