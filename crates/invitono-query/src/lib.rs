//! Read-only query layer for the Invitono contract.
//!
//! This crate translates application-level queries into table-row reads
//! against a fixed contract account and scope, and decodes the results into
//! the typed records from `invitono-types`. All reads are
//! eventually-consistent snapshots against whatever node answers the RPC
//! endpoint; there is no caching, retry, or pagination beyond the single
//! page requested.

mod client;
mod contract;

pub use client::{ChainInfo, RpcClient, TableQuery, TableRowsResponse};
pub use contract::ContractReader;

use thiserror::Error;

/// Errors that can occur during contract queries.
#[derive(Debug, Error)]
pub enum QueryError {
	/// Error during network communication with the RPC endpoint.
	#[error("Network error: {0}")]
	Network(String),
	/// Error when a response cannot be decoded into the expected shape.
	#[error("Invalid response data: {0}")]
	InvalidData(String),
}
