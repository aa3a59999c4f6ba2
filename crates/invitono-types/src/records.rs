//! Records decoded from the contract's table storage.
//!
//! Field names match the on-chain table serialization exactly; these structs
//! are deserialized straight from `get_table_rows` responses and never
//! constructed by the client outside of tests.

use crate::AccountName;
use serde::{Deserialize, Serialize};

/// A registered participant tracked by the contract.
///
/// Rows live in the `adopters` table, keyed by account with a secondary
/// index on score. Immutable from the client's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adopter {
	/// The participant's account.
	pub account: AccountName,
	/// The account that invited this participant.
	pub invitedby: AccountName,
	/// Last update time, seconds since epoch.
	pub lastupdated: u64,
	/// Referral score. Reset to zero by the contract on reward claim.
	pub score: u32,
	/// Whether the current reward cycle has been claimed.
	pub claimed: bool,
}

/// The contract's singleton configuration row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
	/// Minimum account age required to redeem an invite, in days.
	pub min_account_age_days: u32,
	/// Cooldown between invites, in seconds.
	pub invite_rate_seconds: u32,
	/// Whether the contract currently accepts actions.
	pub enabled: bool,
	/// Contract administrator.
	pub admin: AccountName,
	/// Maximum depth of the referral tree considered for scoring.
	pub max_referral_depth: u32,
	/// Score multiplier applied by the contract.
	pub multiplier: u32,
	/// Token contract that pays out rewards.
	pub token_contract: AccountName,
	/// Symbol of the reward token.
	pub reward_symbol: String,
	/// Reward rate, scaled by 100.
	pub reward_rate: u32,
}

/// The contract's singleton statistics row. Eventually-consistent snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractStats {
	/// Total number of redeemed referrals.
	pub total_referrals: u64,
	/// Total number of registered users.
	pub total_users: u64,
	/// The most recently registered account.
	pub last_registered: AccountName,
}
