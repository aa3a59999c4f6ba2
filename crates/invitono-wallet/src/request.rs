//! Login request and callback payloads.
//!
//! Payloads cross page loads inside query parameters, so they are carried as
//! URL-safe base64 over compact JSON. The same transport is used in both
//! directions: the client encodes the signed login request it sends to the
//! identity provider, and decodes the response payload the provider appends
//! to the callback address.

use crate::navigator::PageLocation;
use crate::{VerificationCode, WalletError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

/// Query parameter carrying the login payload in both protocol phases.
pub const PARAM_PAYLOAD: &str = "payload";
/// Query parameter flagging callback success.
pub const PARAM_SUCCESS: &str = "success";

/// The fields of a login request, assembled by the session controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequestPayload {
	/// Fresh random nonce tying the eventual response to this request.
	#[serde(rename = "randomString")]
	pub random_string: String,
	/// Origin of the page initiating the login.
	pub origin: String,
	/// Ephemeral public key the provider should bind the session to.
	#[serde(rename = "publicKey")]
	pub public_key: String,
	/// Path on the origin the provider should redirect back to.
	#[serde(rename = "callbackPath")]
	pub callback_path: String,
}

/// A login request signed by the identity provider's key manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedLoginRequest {
	/// The signed credential, opaque to the session controller.
	pub credential: serde_json::Value,
}

impl SignedLoginRequest {
	/// Serializes the request for transport in a query parameter.
	pub fn encode(&self) -> String {
		encode_payload(&self.credential)
	}
}

/// Encodes a JSON payload as URL-safe base64 for query-parameter transport.
pub fn encode_payload(value: &serde_json::Value) -> String {
	// Serializing a Value cannot fail.
	let bytes = serde_json::to_vec(value).unwrap_or_default();
	URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes a query-parameter payload back into JSON.
///
/// A payload that does not decode is a fatal verification failure, not a
/// benign one: the page *was* loaded as a callback, with a corrupt payload.
pub fn decode_payload(encoded: &str) -> Result<serde_json::Value, WalletError> {
	let bytes = URL_SAFE_NO_PAD
		.decode(encoded.as_bytes())
		.map_err(|e| WalletError::Verification {
			code: VerificationCode::InvalidPayload,
			message: format!("Payload is not valid base64: {}", e),
		})?;

	serde_json::from_slice(&bytes).map_err(|e| WalletError::Verification {
		code: VerificationCode::InvalidPayload,
		message: format!("Payload is not valid JSON: {}", e),
	})
}

/// A login callback lifted from the page's query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCallback {
	/// The encoded response payload.
	pub payload: String,
	/// The provider's success flag, when present.
	pub success: Option<bool>,
}

impl LoginCallback {
	/// Extracts a callback from the current location, if one is present.
	///
	/// Absence of the payload parameter simply means this page load is not a
	/// callback.
	pub fn from_location(location: &PageLocation) -> Option<Self> {
		let payload = location.param(PARAM_PAYLOAD)?.to_string();
		let success = location.param(PARAM_SUCCESS).map(|value| value == "true");
		Some(Self { payload, success })
	}
}

/// Removes processed callback parameters from a location.
pub fn scrub_callback(location: &PageLocation) -> PageLocation {
	location.without_params(&[PARAM_PAYLOAD, PARAM_SUCCESS])
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn payload_round_trips_through_query_transport() {
		let value = serde_json::json!({
			"requests": [{"login": {"randomString": "abc", "origin": "https://x"}}]
		});

		let encoded = encode_payload(&value);
		assert!(!encoded.contains('='), "transport must be unpadded");
		assert_eq!(decode_payload(&encoded).unwrap(), value);
	}

	#[test]
	fn corrupt_payload_is_a_fatal_verification_error() {
		let err = decode_payload("!!!not-base64!!!").unwrap_err();
		assert!(!err.is_benign_verification());
		assert!(matches!(
			err,
			WalletError::Verification {
				code: VerificationCode::InvalidPayload,
				..
			}
		));
	}

	#[test]
	fn callback_is_detected_only_when_payload_present() {
		let plain = PageLocation::new("https://invite.example.com", "/");
		assert!(LoginCallback::from_location(&plain).is_none());

		let callback = plain
			.with_param(PARAM_PAYLOAD, "abc")
			.with_param(PARAM_SUCCESS, "true");
		let parsed = LoginCallback::from_location(&callback).unwrap();
		assert_eq!(parsed.payload, "abc");
		assert_eq!(parsed.success, Some(true));
	}

	#[test]
	fn scrub_removes_both_callback_params() {
		let location = PageLocation::new("https://invite.example.com", "/")
			.with_param(PARAM_PAYLOAD, "abc")
			.with_param(PARAM_SUCCESS, "true");
		let scrubbed = scrub_callback(&location);
		assert!(scrubbed.query.is_empty());
	}

	#[test]
	fn login_request_payload_uses_provider_field_names() {
		let payload = LoginRequestPayload {
			random_string: "nonce".to_string(),
			origin: "https://invite.example.com".to_string(),
			public_key: "PUB_K1_abc".to_string(),
			callback_path: "/".to_string(),
		};

		let json = serde_json::to_value(&payload).unwrap();
		assert_eq!(json["randomString"], "nonce");
		assert_eq!(json["publicKey"], "PUB_K1_abc");
		assert_eq!(json["callbackPath"], "/");
	}
}
