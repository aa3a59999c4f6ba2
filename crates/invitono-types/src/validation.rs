//! Validation errors for user-supplied input.

use thiserror::Error;

/// Errors raised when user-supplied input fails validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
	/// Error when a string is not a valid on-chain account name.
	#[error("Invalid account name: {0}")]
	InvalidAccountName(String),
	/// Error when a required field is empty.
	#[error("Required field is empty: {0}")]
	EmptyField(String),
}
