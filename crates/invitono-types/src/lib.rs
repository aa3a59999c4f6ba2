//! Shared domain types for the Invitono referral client.
//!
//! This crate defines the records read from the Invitono smart contract's
//! table storage, the validated account-name type used for every on-chain
//! identifier, and the referral-level math that maps a score to its
//! reward-bonus tier.

mod account;
mod level;
mod records;
mod validation;

pub use account::AccountName;
pub use level::{bonus_percent, referral_level, REFERRAL_THRESHOLDS};
pub use records::{Adopter, ContractConfig, ContractStats};
pub use validation::ValidationError;
