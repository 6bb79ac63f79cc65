// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use garden_server_audit::{AuditEventKind, AuditLogEntry, AuditService};
use garden_server_auth::{
	Account, AccountId, LinkedIdentity, Session, SessionId, SESSION_VALIDITY_DAYS,
};
use garden_server_config::ServerConfig;
use garden_server_db::{LinkedLogin, RevokeOutcome};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::error::{IdentityError, Result};
use crate::request::{AuthenticationRequest, AuthenticationResult, LogoutMode, LogoutRequest};
use crate::stores::IdentityStores;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves verified identity assertions into accounts and sessions.
///
/// Stateless between calls: every operation runs against the injected
/// stores, bounded by the request timeout and the caller's cancellation
/// token. Audit events are queued on the [`AuditService`] and never affect
/// the outcome of an operation.
#[derive(Clone)]
pub struct IdentityResolutionService {
	stores: IdentityStores,
	audit: Arc<AuditService>,
	request_timeout: Duration,
	session_validity: chrono::Duration,
}

impl IdentityResolutionService {
	pub fn new(stores: IdentityStores, audit: Arc<AuditService>) -> Self {
		Self {
			stores,
			audit,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			session_validity: chrono::Duration::days(SESSION_VALIDITY_DAYS),
		}
	}

	pub fn from_config(
		stores: IdentityStores,
		audit: Arc<AuditService>,
		config: &ServerConfig,
	) -> Self {
		Self::new(stores, audit)
			.with_request_timeout(config.identity.request_timeout())
			.with_session_validity(config.session.validity())
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	pub fn with_session_validity(mut self, validity: chrono::Duration) -> Self {
		self.session_validity = validity;
		self
	}

	// =========================================================================
	// Authentication
	// =========================================================================

	/// Resolves a verified assertion into an account, its workspaces and a
	/// fresh session.
	///
	/// - A known subject id takes the existing-account path.
	/// - An unknown subject with a known email links the provider to that
	///   account.
	/// - Otherwise the account is bootstrapped with its default workspace.
	#[tracing::instrument(skip(self, request, cancel), fields(provider = %request.provider))]
	pub async fn complete_authentication(
		&self,
		request: AuthenticationRequest,
		cancel: &CancellationToken,
	) -> Result<AuthenticationResult> {
		self.bounded(cancel, self.resolve(&request)).await
	}

	async fn resolve(&self, request: &AuthenticationRequest) -> Result<AuthenticationResult> {
		request.validate()?;

		let mut retried = false;
		loop {
			if let Some(account) = self.find_by_subject(request).await? {
				return self.authenticate_existing(account, request).await;
			}

			if let Some(account) = self
				.stores
				.accounts
				.get_account_by_email(&request.email)
				.await?
			{
				return self.link_and_authenticate(account, request).await;
			}

			match self.register(request).await {
				Err(e) if e.is_conflict() && !retried => {
					retried = true;
					tracing::info!("registration lost a race, re-resolving");
				}
				result => return result,
			}
		}
	}

	/// Accounts are found by the subject id they were created with, or by any
	/// provider identity linked to them since.
	async fn find_by_subject(&self, request: &AuthenticationRequest) -> Result<Option<Account>> {
		if let Some(account) = self
			.stores
			.accounts
			.get_account_by_external_subject_id(&request.external_subject_id)
			.await?
		{
			return Ok(Some(account));
		}

		let linked = self
			.stores
			.identities
			.get_identity_by_provider(&request.provider, &request.external_subject_id)
			.await?;
		match linked {
			Some(identity) => Ok(self
				.stores
				.accounts
				.get_account_by_id(&identity.account_id)
				.await?),
			None => Ok(None),
		}
	}

	async fn authenticate_existing(
		&self,
		mut account: Account,
		request: &AuthenticationRequest,
	) -> Result<AuthenticationResult> {
		let now = Utc::now();
		self
			.stores
			.accounts
			.record_login(&account.id, &request.provider, now)
			.await?;
		account.last_authenticated_at = Some(now);
		account.last_provider = request.provider.clone();

		let workspaces = self
			.stores
			.workspaces
			.list_workspaces_for_account(&account.id)
			.await?;
		let session = self.open_session(account.id, request).await?;

		self.emit(
			AuditLogEntry::builder(AuditEventKind::Login)
				.account(account.id)
				.maybe_ip_address(request.ip_address.as_deref())
				.maybe_user_agent(request.user_agent.as_deref())
				.metadata(json!({
					"provider": request.provider.as_str(),
					"device_id": request.device_id,
				}))
				.build(),
		);

		tracing::info!(account_id = %account.id, session_id = %session.id, "existing account authenticated");
		Ok(AuthenticationResult {
			account,
			workspaces,
			session_id: session.id,
			is_new_account: false,
		})
	}

	async fn link_and_authenticate(
		&self,
		mut account: Account,
		request: &AuthenticationRequest,
	) -> Result<AuthenticationResult> {
		let identity = LinkedIdentity::new(
			account.id,
			request.provider.clone(),
			request.external_subject_id.clone(),
		);
		let newly_linked = self.stores.identities.link_identity(&identity).await?;

		let login = LinkedLogin {
			provider: request.provider.clone(),
			external_subject_id: request.external_subject_id.clone(),
			photo_url: request.photo_url.clone(),
			at: Utc::now(),
		};
		self
			.stores
			.accounts
			.record_linked_login(&account.id, &login)
			.await?;
		account.last_provider = login.provider;
		account.last_authenticated_at = Some(login.at);
		if account.photo_url.is_none() {
			account.photo_url = login.photo_url;
		}
		if account.external_subject_id.is_none() {
			account.external_subject_id = Some(login.external_subject_id);
		}

		let workspaces = self
			.stores
			.workspaces
			.list_workspaces_for_account(&account.id)
			.await?;
		let session = self.open_session(account.id, request).await?;

		let kind = if newly_linked {
			AuditEventKind::AccountLinked
		} else {
			AuditEventKind::Login
		};
		self.emit(
			AuditLogEntry::builder(kind)
				.account(account.id)
				.maybe_ip_address(request.ip_address.as_deref())
				.maybe_user_agent(request.user_agent.as_deref())
				.metadata(json!({
					"email": request.email,
					"provider": request.provider.as_str(),
				}))
				.build(),
		);

		tracing::info!(
			account_id = %account.id,
			session_id = %session.id,
			newly_linked,
			"account authenticated through linked provider"
		);
		Ok(AuthenticationResult {
			account,
			workspaces,
			session_id: session.id,
			is_new_account: false,
		})
	}

	async fn register(&self, request: &AuthenticationRequest) -> Result<AuthenticationResult> {
		let created = match self
			.stores
			.bootstrap
			.bootstrap_account(&request.new_account())
			.await
		{
			Ok(created) => created,
			Err(e) => {
				self.emit(
					AuditLogEntry::builder(AuditEventKind::Registered)
						.success(false)
						.maybe_ip_address(request.ip_address.as_deref())
						.maybe_user_agent(request.user_agent.as_deref())
						.metadata(json!({
							"email": request.email,
							"provider": request.provider.as_str(),
							"error": e.to_string(),
						}))
						.build(),
				);
				tracing::warn!(error = %e, "account bootstrap failed");
				return Err(IdentityError::from_bootstrap(e));
			}
		};

		let account_id = created.account.id;
		let session = self.open_session(account_id, request).await?;

		self.emit(
			AuditLogEntry::builder(AuditEventKind::Registered)
				.account(account_id)
				.maybe_ip_address(request.ip_address.as_deref())
				.maybe_user_agent(request.user_agent.as_deref())
				.metadata(json!({
					"provider": request.provider.as_str(),
					"workspace_id": created.workspace.id.to_string(),
				}))
				.build(),
		);

		tracing::info!(account_id = %account_id, session_id = %session.id, "new account registered");
		Ok(AuthenticationResult {
			account: created.account,
			workspaces: vec![created.workspace],
			session_id: session.id,
			is_new_account: true,
		})
	}

	async fn open_session(
		&self,
		account_id: AccountId,
		request: &AuthenticationRequest,
	) -> Result<Session> {
		let mut session = Session::with_validity(account_id, self.session_validity);
		session.device_id = request.device_id.clone();
		session.device_metadata = request.device_metadata.clone();
		session.ip_address = request.ip_address.clone();
		session.user_agent = request.user_agent.clone();

		self.stores.sessions.create_session(&session).await?;
		Ok(session)
	}

	// =========================================================================
	// Sessions
	// =========================================================================

	/// Revokes sessions for one device or for the whole account.
	///
	/// Returns the number of sessions revoked for `revoke_all`, and 1 for a
	/// device logout. A device with no live sessions is [`IdentityError::NotFound`].
	#[tracing::instrument(skip(self, request, cancel), fields(account_id = %request.account_id))]
	pub async fn logout(&self, request: LogoutRequest, cancel: &CancellationToken) -> Result<u64> {
		let mode = request.mode()?;
		let account_id = request.account_id;

		self
			.bounded(cancel, async {
				let (revoked, returned) = match &mode {
					LogoutMode::All => {
						let count = self
							.stores
							.sessions
							.revoke_all_sessions_for_account(&account_id)
							.await?;
						(count, count)
					}
					LogoutMode::Device(device_id) => {
						let count = self
							.stores
							.sessions
							.revoke_sessions_for_device(&account_id, device_id)
							.await?;
						if count == 0 {
							return Err(IdentityError::NotFound("device session".to_string()));
						}
						(count, 1)
					}
				};

				self.emit(
					AuditLogEntry::builder(AuditEventKind::Logout)
						.account(account_id)
						.metadata(json!({
							"mode": mode.as_str(),
							"count": revoked,
						}))
						.build(),
				);

				tracing::info!(account_id = %account_id, mode = mode.as_str(), revoked, "logout");
				Ok(returned)
			})
			.await
	}

	/// Revokes one specific session owned by `account_id`.
	#[tracing::instrument(skip(self, cancel), fields(account_id = %account_id, session_id = %session_id))]
	pub async fn revoke_session(
		&self,
		account_id: AccountId,
		session_id: SessionId,
		cancel: &CancellationToken,
	) -> Result<()> {
		self
			.bounded(cancel, async {
				let owned = self
					.stores
					.sessions
					.get_session(&session_id)
					.await?
					.is_some_and(|s| s.account_id == account_id);
				if !owned {
					return Err(IdentityError::NotFound("session".to_string()));
				}

				match self.stores.sessions.revoke_session(&session_id).await? {
					RevokeOutcome::Revoked => {}
					RevokeOutcome::NotFound => {
						return Err(IdentityError::NotFound("session".to_string()))
					}
					RevokeOutcome::AlreadyRevoked => return Err(IdentityError::AlreadyRevoked),
				}

				self.emit(
					AuditLogEntry::builder(AuditEventKind::SessionRevoked)
						.account(account_id)
						.metadata(json!({ "session_id": session_id.to_string() }))
						.build(),
				);
				Ok(())
			})
			.await
	}

	#[tracing::instrument(skip(self, cancel), fields(account_id = %account_id))]
	pub async fn list_active_sessions(
		&self,
		account_id: AccountId,
		cancel: &CancellationToken,
	) -> Result<Vec<Session>> {
		self
			.bounded(cancel, async {
				let sessions = self
					.stores
					.sessions
					.list_active_sessions_for_account(&account_id, Utc::now())
					.await?;
				Ok::<_, IdentityError>(sessions)
			})
			.await
	}

	// =========================================================================
	// Account lifecycle
	// =========================================================================

	/// Soft-deletes the account and revokes all of its sessions. Returns the
	/// number of sessions revoked.
	#[tracing::instrument(skip(self, cancel), fields(account_id = %account_id))]
	pub async fn delete_account(
		&self,
		account_id: AccountId,
		cancel: &CancellationToken,
	) -> Result<u64> {
		self
			.bounded(cancel, async {
				if self
					.stores
					.accounts
					.get_account_by_id(&account_id)
					.await?
					.is_none()
				{
					return Err(IdentityError::NotFound("account".to_string()));
				}

				let revoked = self
					.stores
					.sessions
					.revoke_all_sessions_for_account(&account_id)
					.await?;
				if !self.stores.accounts.soft_delete_account(&account_id).await? {
					return Err(IdentityError::NotFound("account".to_string()));
				}

				self.emit(
					AuditLogEntry::builder(AuditEventKind::AccountDeleted)
						.account(account_id)
						.metadata(json!({ "sessions_revoked": revoked }))
						.build(),
				);

				tracing::info!(account_id = %account_id, revoked, "account deleted");
				Ok(revoked)
			})
			.await
	}

	// =========================================================================
	// Helpers
	// =========================================================================

	/// Runs `operation` until it completes, `cancel` fires or the request
	/// timeout elapses. Dropping the operation rolls back any transaction it
	/// holds open.
	async fn bounded<T, F>(&self, cancel: &CancellationToken, operation: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		if cancel.is_cancelled() {
			return Err(IdentityError::Cancelled);
		}

		tokio::select! {
			biased;
			() = cancel.cancelled() => {
				tracing::warn!("identity operation cancelled");
				Err(IdentityError::Cancelled)
			}
			outcome = tokio::time::timeout(self.request_timeout, operation) => match outcome {
				Ok(result) => result,
				Err(_) => {
					tracing::warn!(timeout = ?self.request_timeout, "identity operation deadline exceeded");
					Err(IdentityError::DeadlineExceeded(self.request_timeout))
				}
			},
		}
	}

	fn emit(&self, entry: AuditLogEntry) {
		let kind = entry.event_kind;
		if !self.audit.log(entry) {
			tracing::warn!(event_kind = %kind, "audit event dropped");
		}
	}
}
