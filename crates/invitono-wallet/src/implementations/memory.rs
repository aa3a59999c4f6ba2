//! In-process identity provider and navigator.
//!
//! A development and test stand-in for the hosted wallet: it keeps the
//! pending login request, the active session, and the signed actions in
//! memory, and produces the same error codes the hosted SDK does, so the
//! session machine exercises its real classification paths against it.

use crate::navigator::{Navigator, PageLocation};
use crate::request::{decode_payload, encode_payload, LoginCallback, LoginRequestPayload, SignedLoginRequest};
use crate::session::IdentityProvider;
use crate::{ContractAction, IdentityHandle, VerificationCode, WalletError};
use async_trait::async_trait;
use invitono_types::AccountName;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Inner {
	pending: Option<LoginRequestPayload>,
	session: Option<IdentityHandle>,
	accounts: HashMap<String, AccountName>,
	signed_actions: Vec<ContractAction>,
}

/// In-memory identity provider.
pub struct MemoryProvider {
	inner: Mutex<Inner>,
	public_key: String,
	fail_logout: AtomicBool,
}

impl MemoryProvider {
	/// Creates an empty provider with a fresh ephemeral key.
	pub fn new() -> Self {
		Self {
			inner: Mutex::new(Inner::default()),
			public_key: format!("PUB_K1_{}", Uuid::new_v4().simple()),
			fail_logout: AtomicBool::new(false),
		}
	}

	/// Registers the account name an identity resolves to.
	pub fn register_account(&self, did: &str, account: AccountName) {
		let mut inner = self.inner.lock().expect("provider lock poisoned");
		inner.accounts.insert(did.to_string(), account);
	}

	/// Seeds an already-active session, as if a previous visit logged in.
	pub fn seed_session(&self, did: &str) {
		let mut inner = self.inner.lock().expect("provider lock poisoned");
		inner.session = Some(IdentityHandle::new(did));
	}

	/// Makes the remote half of `logout` fail.
	pub fn set_fail_logout(&self, fail: bool) {
		self.fail_logout.store(fail, Ordering::SeqCst);
	}

	/// Whether a login request is currently pending.
	pub fn has_pending_request(&self) -> bool {
		self.inner.lock().expect("provider lock poisoned").pending.is_some()
	}

	/// Plays the wallet's part: approves the pending request for `did` and
	/// returns the encoded response payload the SSO page would append to the
	/// callback address.
	pub fn approve_pending(&self, did: &str) -> Result<String, WalletError> {
		let inner = self.inner.lock().expect("provider lock poisoned");
		let pending = inner
			.pending
			.as_ref()
			.ok_or_else(|| WalletError::Provider("No login request to approve".to_string()))?;

		Ok(encode_payload(&serde_json::json!({
			"response": {
				"randomString": pending.random_string,
				"did": did,
				"origin": pending.origin,
			}
		})))
	}

	/// Actions signed through this provider, oldest first.
	pub fn signed_actions(&self) -> Vec<ContractAction> {
		self.inner
			.lock()
			.expect("provider lock poisoned")
			.signed_actions
			.clone()
	}
}

impl Default for MemoryProvider {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl IdentityProvider for MemoryProvider {
	async fn ephemeral_public_key(&self) -> Result<String, WalletError> {
		Ok(self.public_key.clone())
	}

	async fn sign_login_request(
		&self,
		payload: &LoginRequestPayload,
	) -> Result<SignedLoginRequest, WalletError> {
		let mut inner = self.inner.lock().expect("provider lock poisoned");
		inner.pending = Some(payload.clone());

		Ok(SignedLoginRequest {
			credential: serde_json::json!({
				"requests": [{ "login": payload }],
				"signature": format!("memsig-{}", payload.random_string),
			}),
		})
	}

	async fn verify_login_response(
		&self,
		callback: &LoginCallback,
	) -> Result<IdentityHandle, WalletError> {
		let mut inner = self.inner.lock().expect("provider lock poisoned");

		let pending = inner.pending.as_ref().ok_or(WalletError::Verification {
			code: VerificationCode::RequestsNotFound,
			message: "No login request is pending".to_string(),
		})?;

		let value = decode_payload(&callback.payload)?;

		let response = value.get("response").ok_or(WalletError::Verification {
			code: VerificationCode::ResponsesNotFound,
			message: "Payload carries no login response".to_string(),
		})?;

		let nonce = response.get("randomString").and_then(|v| v.as_str());
		if nonce != Some(pending.random_string.as_str()) {
			return Err(WalletError::Verification {
				code: VerificationCode::ResponseMismatch,
				message: "Response does not match the pending request".to_string(),
			});
		}

		let did = response
			.get("did")
			.and_then(|v| v.as_str())
			.ok_or(WalletError::Verification {
				code: VerificationCode::ResponseMismatch,
				message: "Response carries no identity".to_string(),
			})?
			.to_string();

		inner.pending = None;
		let identity = IdentityHandle::new(did);
		inner.session = Some(identity.clone());
		Ok(identity)
	}

	async fn restore_session(
		&self,
		_auto_logout: bool,
	) -> Result<Option<IdentityHandle>, WalletError> {
		Ok(self.inner.lock().expect("provider lock poisoned").session.clone())
	}

	async fn account_name(&self, identity: &IdentityHandle) -> Result<AccountName, WalletError> {
		self.inner
			.lock()
			.expect("provider lock poisoned")
			.accounts
			.get(&identity.did)
			.cloned()
			.ok_or_else(|| {
				WalletError::Provider(format!("No account registered for {}", identity.did))
			})
	}

	async fn logout(&self, _identity: &IdentityHandle) -> Result<(), WalletError> {
		if self.fail_logout.load(Ordering::SeqCst) {
			return Err(WalletError::Network(
				"Logout endpoint unreachable".to_string(),
			));
		}

		self.inner.lock().expect("provider lock poisoned").session = None;
		Ok(())
	}

	async fn sign_transaction(
		&self,
		identity: &IdentityHandle,
		contract: &AccountName,
		action: &str,
		payload: serde_json::Value,
	) -> Result<(), WalletError> {
		let mut inner = self.inner.lock().expect("provider lock poisoned");

		if inner.session.as_ref() != Some(identity) {
			return Err(WalletError::Unauthenticated);
		}

		inner.signed_actions.push(ContractAction {
			contract: contract.clone(),
			action: action.to_string(),
			payload,
		});
		Ok(())
	}
}

/// In-memory navigator holding a single mutable location.
pub struct MemoryNavigator {
	location: Mutex<PageLocation>,
	navigations: Mutex<Vec<String>>,
}

impl MemoryNavigator {
	/// Creates a navigator at the given starting location.
	pub fn new(location: PageLocation) -> Self {
		Self {
			location: Mutex::new(location),
			navigations: Mutex::new(Vec::new()),
		}
	}

	/// Moves the page, as a real navigation or redirect landing would.
	pub fn set_location(&self, location: PageLocation) {
		*self.location.lock().expect("navigator lock poisoned") = location;
	}

	/// The current location, for assertions.
	pub fn current_location(&self) -> PageLocation {
		self.location.lock().expect("navigator lock poisoned").clone()
	}

	/// Every full-page navigation issued so far, oldest first.
	pub fn navigations(&self) -> Vec<String> {
		self.navigations
			.lock()
			.expect("navigator lock poisoned")
			.clone()
	}
}

impl Navigator for MemoryNavigator {
	fn location(&self) -> PageLocation {
		self.current_location()
	}

	fn navigate(&self, url: &str) {
		self.navigations
			.lock()
			.expect("navigator lock poisoned")
			.push(url.to_string());
	}

	fn replace_location(&self, location: &PageLocation) {
		self.set_location(location.clone());
	}
}
