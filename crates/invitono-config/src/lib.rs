//! Configuration for the Invitono referral client.
//!
//! All configuration is environment-provided with defaults and read once at
//! startup; there is no runtime reconfiguration. Unparseable numeric values
//! fall back to their defaults, while a malformed contract account name is a
//! hard error since every query and transaction is addressed to it.

use invitono_types::AccountName;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error when a configured value fails validation.
	#[error("Validation error: {0}")]
	Validation(String),
}

/// Environment variable naming the contract account.
pub const ENV_CONTRACT_ACCOUNT: &str = "INVITONO_CONTRACT_ACCOUNT";
/// Environment variable naming the RPC endpoint URL.
pub const ENV_RPC_ENDPOINT: &str = "INVITONO_RPC_ENDPOINT";
/// Environment variable naming the expected chain id.
pub const ENV_CHAIN_ID: &str = "INVITONO_CHAIN_ID";
/// Environment variable for the leaderboard row limit.
pub const ENV_LEADERBOARD_LIMIT: &str = "INVITONO_LEADERBOARD_LIMIT";
/// Environment variable for the identity provider's SSO origin.
pub const ENV_SSO_ORIGIN: &str = "INVITONO_SSO_ORIGIN";

const DEFAULT_CONTRACT_ACCOUNT: &str = "invitono";
const DEFAULT_RPC_ENDPOINT: &str = "https://mainnet.tonomy.io";
const DEFAULT_CHAIN_ID: &str = "1064487b3cd1a897ce03ae5b6a865651747e2e152090f99c1d19d44e01aea5a4";
const DEFAULT_LEADERBOARD_LIMIT: u32 = 25;
const DEFAULT_SSO_ORIGIN: &str = "https://accounts.tonomy.io";

/// Application configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
	/// Human-readable application name.
	pub app_name: String,
	/// Account the Invitono contract is deployed under. Also used as the
	/// table scope for every read.
	pub contract_account: AccountName,
	/// Base URL of the blockchain RPC endpoint.
	pub rpc_endpoint: String,
	/// Chain id the client expects to be talking to.
	pub chain_id: String,
	/// Maximum number of leaderboard rows to request.
	pub leaderboard_limit: u32,
	/// Origin of the identity provider's hosted login page.
	pub sso_origin: String,
}

impl AppConfig {
	/// Loads configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads configuration through an arbitrary lookup function.
	///
	/// `from_env` delegates here; tests inject a map instead of mutating the
	/// process environment.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let contract_account = lookup(ENV_CONTRACT_ACCOUNT)
			.unwrap_or_else(|| DEFAULT_CONTRACT_ACCOUNT.to_string());
		let contract_account = AccountName::new(&contract_account)
			.map_err(|e| ConfigError::Validation(format!("{}: {}", ENV_CONTRACT_ACCOUNT, e)))?;

		let rpc_endpoint = lookup(ENV_RPC_ENDPOINT)
			.unwrap_or_else(|| DEFAULT_RPC_ENDPOINT.to_string())
			.trim_end_matches('/')
			.to_string();

		let chain_id = lookup(ENV_CHAIN_ID).unwrap_or_else(|| DEFAULT_CHAIN_ID.to_string());

		let leaderboard_limit = parse_u32(
			ENV_LEADERBOARD_LIMIT,
			lookup(ENV_LEADERBOARD_LIMIT),
			DEFAULT_LEADERBOARD_LIMIT,
		);

		let sso_origin = lookup(ENV_SSO_ORIGIN)
			.unwrap_or_else(|| DEFAULT_SSO_ORIGIN.to_string())
			.trim_end_matches('/')
			.to_string();

		Ok(Self {
			app_name: "Tonomy Invite".to_string(),
			contract_account,
			rpc_endpoint,
			chain_id,
			leaderboard_limit,
			sso_origin,
		})
	}
}

fn parse_u32(key: &str, value: Option<String>, fallback: u32) -> u32 {
	match value {
		None => fallback,
		Some(raw) => match raw.trim().parse::<u32>() {
			Ok(parsed) => parsed,
			Err(_) => {
				warn!("Ignoring unparseable {} value {:?}", key, raw);
				fallback
			},
		},
	}
}
