//! Wallet session lifecycle for the Invitono client.
//!
//! This crate implements the redirect-based single-sign-on protocol as an
//! explicit two-phase state machine. In the request phase a signed login
//! request is serialized into a query parameter and the browser navigates to
//! the identity provider's hosted login page; in the callback phase the next
//! page load inspects its own address for the response payload, verifies it,
//! and scrubs the parameters so a reload does not reprocess them.
//!
//! The identity provider SDK and the page location are both trait seams
//! (`IdentityProvider`, `Navigator`) so the session machine can be driven
//! against the hosted wallet in production and against in-process
//! implementations in development and tests.

mod navigator;
mod request;
mod session;

pub mod implementations {
	//! In-process implementations of the trait seams.
	pub mod memory;
}

pub use navigator::{Navigator, PageLocation};
pub use request::{
	decode_payload, encode_payload, LoginCallback, LoginRequestPayload, SignedLoginRequest,
	PARAM_PAYLOAD, PARAM_SUCCESS,
};
pub use session::{IdentityProvider, Session, SessionState, WalletService};

#[cfg(feature = "testing")]
pub use session::MockIdentityProvider;

use invitono_types::AccountName;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Provider error codes attached to login-response verification failures.
///
/// Only `RequestsNotFound` and `ResponsesNotFound` are benign: they mean the
/// page simply was not loaded as a login callback. Every other code is a
/// genuine failure and must surface to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationCode {
	/// No login request is pending on this client.
	RequestsNotFound,
	/// The callback carried no login response.
	ResponsesNotFound,
	/// The callback carried a response of the wrong type.
	InvalidRequestResponseType,
	/// The callback payload could not be decoded.
	InvalidPayload,
	/// The response did not match the pending request.
	ResponseMismatch,
}

/// Errors that can occur during wallet session operations.
#[derive(Debug, Error)]
pub enum WalletError {
	/// Error during network communication with the identity provider.
	#[error("Network error: {0}")]
	Network(String),
	/// Error verifying a login callback.
	#[error("Login verification failed ({code:?}): {message}")]
	Verification {
		/// Provider error code, used to classify benign vs fatal failures.
		code: VerificationCode,
		/// Human-readable description from the provider.
		message: String,
	},
	/// An action that requires a session was attempted without one.
	#[error("Log in with your wallet before signing.")]
	Unauthenticated,
	/// Error reported by the identity provider implementation.
	#[error("Identity provider error: {0}")]
	Provider(String),
}

impl WalletError {
	/// Whether this is a benign verification failure.
	///
	/// Benign failures occur on every ordinary page load that is not a login
	/// callback; the session machine falls through to restoration instead of
	/// surfacing them.
	pub fn is_benign_verification(&self) -> bool {
		matches!(
			self,
			WalletError::Verification {
				code: VerificationCode::RequestsNotFound | VerificationCode::ResponsesNotFound,
				..
			}
		)
	}
}

/// Opaque handle to an authenticated identity, as issued by the provider.
///
/// The human-readable [`AccountName`] is derived from it asynchronously and
/// is only valid alongside a non-null handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityHandle {
	/// Decentralized identifier of the wallet identity.
	pub did: String,
}

impl IdentityHandle {
	/// Creates a handle from a DID string.
	pub fn new(did: impl Into<String>) -> Self {
		Self { did: did.into() }
	}
}

/// A transaction action recorded against the contract.
///
/// What the provider ultimately signs and broadcasts on the user's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAction {
	/// Contract account the action is addressed to.
	pub contract: AccountName,
	/// Action name, e.g. `redeeminvite`.
	pub action: String,
	/// Action payload as contract-shaped JSON.
	pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_not_found_codes_are_benign() {
		let benign = [
			VerificationCode::RequestsNotFound,
			VerificationCode::ResponsesNotFound,
		];
		let fatal = [
			VerificationCode::InvalidRequestResponseType,
			VerificationCode::InvalidPayload,
			VerificationCode::ResponseMismatch,
		];

		for code in benign {
			let err = WalletError::Verification {
				code,
				message: "nothing pending".to_string(),
			};
			assert!(err.is_benign_verification());
		}

		for code in fatal {
			let err = WalletError::Verification {
				code,
				message: "bad callback".to_string(),
			};
			assert!(!err.is_benign_verification());
		}
	}

	#[test]
	fn non_verification_errors_are_never_benign() {
		assert!(!WalletError::Network("offline".to_string()).is_benign_verification());
		assert!(!WalletError::Unauthenticated.is_benign_verification());
	}
}
