//! Validated on-chain account names.

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Maximum length of an account name.
const MAX_NAME_LEN: usize = 12;

/// A validated Antelope-style account name.
///
/// Account names are 1 to 12 characters drawn from `a-z`, `1-5` and `.`,
/// with no leading or trailing dot. Every identifier that crosses the wire,
/// whether typed by a user or decoded from a contract row, goes through this
/// type so downstream code never handles a malformed name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName(String);

impl AccountName {
	/// Parses and validates an account name, trimming surrounding whitespace.
	pub fn new(name: &str) -> Result<Self, ValidationError> {
		let name = name.trim();

		if name.is_empty() {
			return Err(ValidationError::EmptyField("account name".to_string()));
		}

		if name.len() > MAX_NAME_LEN {
			return Err(ValidationError::InvalidAccountName(name.to_string()));
		}

		let charset_ok = name
			.chars()
			.all(|c| c.is_ascii_lowercase() || ('1'..='5').contains(&c) || c == '.');

		if !charset_ok || name.starts_with('.') || name.ends_with('.') {
			return Err(ValidationError::InvalidAccountName(name.to_string()));
		}

		Ok(Self(name.to_string()))
	}

	/// Returns the name as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for AccountName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for AccountName {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

impl TryFrom<String> for AccountName {
	type Error = ValidationError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(&value)
	}
}

impl From<AccountName> for String {
	fn from(name: AccountName) -> Self {
		name.0
	}
}
