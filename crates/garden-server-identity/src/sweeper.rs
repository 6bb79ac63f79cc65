// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background deletion of expired sessions.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use garden_server_db::SessionStore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// Runs `delete_expired_sessions` every `interval` until `cancel` fires.
///
/// The first sweep happens immediately. Sweep failures are logged and the
/// loop keeps going.
pub fn spawn_session_sweeper(
	store: Arc<dyn SessionStore>,
	interval: Duration,
	cancel: CancellationToken,
) -> JoinHandle<()> {
	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(interval.max(MIN_SWEEP_INTERVAL));
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				biased;
				() = cancel.cancelled() => {
					tracing::debug!("session sweeper stopped");
					break;
				}
				_ = ticker.tick() => {
					match store.delete_expired_sessions(Utc::now()).await {
						Ok(0) => {}
						Ok(count) => tracing::info!(count, "expired sessions swept"),
						Err(e) => tracing::warn!(error = %e, "session sweep failed"),
					}
				}
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration as ChronoDuration;
	use garden_server_auth::Session;
	use garden_server_db::testing::{count_rows, create_identity_test_pool, insert_test_account};
	use garden_server_db::SessionRepository;

	#[tokio::test]
	async fn sweeps_expired_sessions_until_cancelled() {
		let pool = create_identity_test_pool().await;
		let account = insert_test_account(&pool, "alice@example.com", "alice").await;
		let repo = SessionRepository::new(pool.clone());
		repo.create_session(&Session::new(account.id)).await.unwrap();
		repo.create_session(&Session::with_validity(account.id, ChronoDuration::seconds(-5)))
			.await
			.unwrap();

		let cancel = CancellationToken::new();
		let handle = spawn_session_sweeper(
			Arc::new(repo),
			Duration::from_millis(20),
			cancel.clone(),
		);

		tokio::time::sleep(Duration::from_millis(100)).await;
		cancel.cancel();
		handle.await.unwrap();

		assert_eq!(count_rows(&pool, "sessions").await, 1);
	}

	#[tokio::test]
	async fn stops_promptly_when_already_cancelled() {
		let pool = create_identity_test_pool().await;
		let cancel = CancellationToken::new();
		cancel.cancel();

		let handle = spawn_session_sweeper(
			Arc::new(SessionRepository::new(pool)),
			Duration::from_secs(3600),
			cancel,
		);

		tokio::time::timeout(Duration::from_secs(1), handle)
			.await
			.unwrap()
			.unwrap();
	}
}
