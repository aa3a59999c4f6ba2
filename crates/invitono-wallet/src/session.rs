//! The wallet session state machine.

use crate::navigator::Navigator;
use crate::request::{
	scrub_callback, LoginCallback, LoginRequestPayload, SignedLoginRequest,
};
use crate::{IdentityHandle, WalletError};
use async_trait::async_trait;
use invitono_types::AccountName;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Lifecycle states of the wallet session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	/// Nothing has happened yet.
	Uninitialized,
	/// Load-time callback processing or session restoration is in flight.
	Restoring,
	/// A login redirect was issued; resumption happens on the next load.
	AwaitingRedirect,
	/// An identity handle is present.
	Authenticated,
	/// No session exists.
	Unauthenticated,
	/// Initialization failed with a surfaced error.
	Error,
}

/// The in-memory session slot.
///
/// Created on page load, populated by callback verification or restoration,
/// cleared on logout. Never persisted by this code; durable session state is
/// the identity provider's responsibility.
#[derive(Debug, Clone, Default)]
pub struct Session {
	/// Handle to the authenticated identity, if any.
	pub identity: Option<IdentityHandle>,
	/// Account name derived from the identity handle.
	pub account: Option<AccountName>,
	/// Whether initialization is still in flight.
	pub loading: bool,
	/// Last surfaced error message, if any.
	pub error: Option<String>,
}

/// The identity provider (wallet) SDK surface the session machine drives.
///
/// Implementations wrap the hosted wallet in production; tests and local
/// development use [`crate::implementations::memory::MemoryProvider`].
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
	/// Returns the ephemeral public key the next login request should carry.
	async fn ephemeral_public_key(&self) -> Result<String, WalletError>;

	/// Signs a login request payload, registering it as pending.
	async fn sign_login_request(
		&self,
		payload: &LoginRequestPayload,
	) -> Result<SignedLoginRequest, WalletError>;

	/// Verifies a login callback against the pending request.
	async fn verify_login_response(
		&self,
		callback: &LoginCallback,
	) -> Result<IdentityHandle, WalletError>;

	/// Restores an existing session from the provider's local state.
	///
	/// Non-interactive; when `auto_logout` is false a missing session must
	/// not trigger any remote side effect.
	async fn restore_session(&self, auto_logout: bool)
		-> Result<Option<IdentityHandle>, WalletError>;

	/// Resolves the human-readable account name for an identity.
	async fn account_name(&self, identity: &IdentityHandle) -> Result<AccountName, WalletError>;

	/// Ends the session on the provider side.
	async fn logout(&self, identity: &IdentityHandle) -> Result<(), WalletError>;

	/// Builds, signs and broadcasts a transaction invoking `action` on
	/// `contract` with the given payload, on behalf of `identity`.
	async fn sign_transaction(
		&self,
		identity: &IdentityHandle,
		contract: &AccountName,
		action: &str,
		payload: serde_json::Value,
	) -> Result<(), WalletError>;
}

/// Orchestrates the redirect-based login handshake, session restoration,
/// logout, and delegated transaction signing.
pub struct WalletService {
	provider: Arc<dyn IdentityProvider>,
	navigator: Arc<dyn Navigator>,
	contract: AccountName,
	sso_origin: String,
	state: RwLock<SessionState>,
	session: RwLock<Session>,
}

impl WalletService {
	/// Creates an uninitialized service addressing the given contract.
	pub fn new(
		provider: Arc<dyn IdentityProvider>,
		navigator: Arc<dyn Navigator>,
		contract: AccountName,
		sso_origin: impl Into<String>,
	) -> Self {
		Self {
			provider,
			navigator,
			contract,
			sso_origin: sso_origin.into().trim_end_matches('/').to_string(),
			state: RwLock::new(SessionState::Uninitialized),
			session: RwLock::new(Session {
				loading: true,
				..Session::default()
			}),
		}
	}

	/// Runs the load-time half of the protocol.
	///
	/// Inspects the current address for a login callback; verifies and
	/// scrubs it when present, treating "nothing pending" failures as an
	/// ordinary page load. Otherwise attempts non-interactive session
	/// restoration. Must complete before `login` or `sign_transaction` are
	/// meaningful.
	pub async fn initialize(&self) -> SessionState {
		self.set_state(SessionState::Restoring).await;
		{
			let mut session = self.session.write().await;
			session.loading = true;
			session.error = None;
		}

		let location = self.navigator.location();
		let mut identity: Option<IdentityHandle> = None;

		if let Some(callback) = LoginCallback::from_location(&location) {
			match self.provider.verify_login_response(&callback).await {
				Ok(verified) => {
					// Scrub the processed parameters so a reload does not
					// replay the callback.
					self.navigator.replace_location(&scrub_callback(&location));
					identity = Some(verified);
				},
				Err(err) if err.is_benign_verification() => {
					debug!("No pending login to complete: {}", err);
				},
				Err(err) => {
					return self.fail_initialize(err).await;
				},
			}
		}

		if identity.is_none() {
			match self.provider.restore_session(false).await {
				Ok(restored) => identity = restored,
				Err(err) => return self.fail_initialize(err).await,
			}
		}

		let state = match identity {
			Some(identity) => {
				{
					let mut session = self.session.write().await;
					session.identity = Some(identity.clone());
				}
				self.resolve_account(&identity).await;
				SessionState::Authenticated
			},
			None => SessionState::Unauthenticated,
		};

		{
			let mut session = self.session.write().await;
			session.loading = false;
		}
		self.set_state(state).await;
		state
	}

	/// Initiates the redirect handshake.
	///
	/// Constructs a signed login request carrying a fresh nonce, the calling
	/// origin, an ephemeral public key and the callback path, then navigates
	/// to the provider's hosted login page. No response is awaited; the
	/// callback phase of [`WalletService::initialize`] resumes the flow on
	/// the next page load.
	pub async fn login(&self) -> Result<(), WalletError> {
		let location = self.navigator.location();

		let payload = LoginRequestPayload {
			random_string: Uuid::new_v4().simple().to_string(),
			origin: location.origin.clone(),
			public_key: self.provider.ephemeral_public_key().await?,
			callback_path: location.path.clone(),
		};

		let signed = self.provider.sign_login_request(&payload).await?;
		let url = format!("{}/login?payload={}", self.sso_origin, signed.encode());

		self.set_state(SessionState::AwaitingRedirect).await;
		self.navigator.navigate(&url);
		Ok(())
	}

	/// Ends the session.
	///
	/// The remote logout is best-effort: the local identity is cleared and
	/// the state becomes `Unauthenticated` even when the provider call
	/// fails.
	pub async fn logout(&self) {
		let identity = {
			let session = self.session.read().await;
			session.identity.clone()
		};

		if let Some(identity) = identity {
			if let Err(err) = self.provider.logout(&identity).await {
				warn!("Remote logout failed, clearing local session anyway: {}", err);
			}
		}

		{
			let mut session = self.session.write().await;
			session.identity = None;
			session.account = None;
		}
		self.set_state(SessionState::Unauthenticated).await;
	}

	/// Delegates signing of a contract action to the identity provider.
	///
	/// Requires an authenticated session; provider failures propagate
	/// untranslated.
	pub async fn sign_transaction(
		&self,
		action: &str,
		payload: serde_json::Value,
	) -> Result<(), WalletError> {
		let identity = {
			let session = self.session.read().await;
			session.identity.clone()
		}
		.ok_or(WalletError::Unauthenticated)?;

		self.provider
			.sign_transaction(&identity, &self.contract, action, payload)
			.await
	}

	/// Snapshot of the current session slot.
	pub async fn session(&self) -> Session {
		self.session.read().await.clone()
	}

	/// Current lifecycle state.
	pub async fn state(&self) -> SessionState {
		*self.state.read().await
	}

	/// The resolved account name, when authenticated.
	pub async fn account(&self) -> Option<AccountName> {
		self.session.read().await.account.clone()
	}

	async fn resolve_account(&self, identity: &IdentityHandle) {
		// Resolution failure surfaces as an error without discarding the
		// authenticated identity.
		match self.provider.account_name(identity).await {
			Ok(account) => {
				let mut session = self.session.write().await;
				session.account = Some(account);
			},
			Err(err) => {
				let mut session = self.session.write().await;
				session.error = Some(err.to_string());
			},
		}
	}

	async fn fail_initialize(&self, err: WalletError) -> SessionState {
		warn!("Session initialization failed: {}", err);
		{
			let mut session = self.session.write().await;
			session.error = Some(err.to_string());
			session.loading = false;
		}
		self.set_state(SessionState::Error).await;
		SessionState::Error
	}

	async fn set_state(&self, state: SessionState) {
		*self.state.write().await = state;
	}
}
