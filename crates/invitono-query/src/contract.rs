//! Typed reads against the Invitono contract's tables.

use crate::{QueryError, RpcClient, TableQuery};
use invitono_types::{AccountName, Adopter, ContractConfig, ContractStats};

/// Table holding one row per registered adopter.
const TABLE_ADOPTERS: &str = "adopters";
/// Singleton configuration table.
const TABLE_CONFIG: &str = "config";
/// Singleton statistics table.
const TABLE_STATS: &str = "stats";

/// High-level read interface over the contract's table storage.
///
/// The contract account doubles as both code and scope for every read, per
/// the contract's storage convention.
#[derive(Debug, Clone)]
pub struct ContractReader {
	rpc: RpcClient,
	contract: AccountName,
}

impl ContractReader {
	/// Creates a reader addressing the given contract account.
	pub fn new(rpc: RpcClient, contract: AccountName) -> Self {
		Self { rpc, contract }
	}

	/// The contract account this reader is addressed to.
	pub fn contract(&self) -> &AccountName {
		&self.contract
	}

	/// Looks up a single adopter row by exact account name.
	///
	/// Returns `Ok(None)` when the account has no row; errors are reserved
	/// for transport and decode failures.
	pub async fn fetch_adopter(&self, account: &AccountName) -> Result<Option<Adopter>, QueryError> {
		let query = self.table_query(TABLE_ADOPTERS, 1).exact_key(account.as_str());
		let mut rows: Vec<Adopter> = self.rpc.get_table_rows(&query).await?;

		if rows.is_empty() {
			Ok(None)
		} else {
			Ok(Some(rows.remove(0)))
		}
	}

	/// Reads up to `limit` adopter rows ordered by the contract's `byscore`
	/// secondary index (non-increasing by score).
	pub async fn fetch_top_adopters(&self, limit: u32) -> Result<Vec<Adopter>, QueryError> {
		let query = self.table_query(TABLE_ADOPTERS, limit).secondary_index("i64");
		let mut rows: Vec<Adopter> = self.rpc.get_table_rows(&query).await?;

		// Never hand back more rows than were asked for, whatever the node says.
		rows.truncate(limit as usize);
		Ok(rows)
	}

	/// Reads the singleton config row; `Ok(None)` means the contract has not
	/// been initialized yet.
	pub async fn fetch_config(&self) -> Result<Option<ContractConfig>, QueryError> {
		self.fetch_singleton(TABLE_CONFIG).await
	}

	/// Reads the singleton stats row.
	pub async fn fetch_stats(&self) -> Result<Option<ContractStats>, QueryError> {
		self.fetch_singleton(TABLE_STATS).await
	}

	/// Reads the chain identifier from node metadata.
	pub async fn fetch_chain_id(&self) -> Result<String, QueryError> {
		Ok(self.rpc.get_info().await?.chain_id)
	}

	async fn fetch_singleton<T: serde::de::DeserializeOwned>(
		&self,
		table: &str,
	) -> Result<Option<T>, QueryError> {
		let query = self.table_query(table, 1);
		let mut rows: Vec<T> = self.rpc.get_table_rows(&query).await?;

		if rows.is_empty() {
			Ok(None)
		} else {
			Ok(Some(rows.remove(0)))
		}
	}

	fn table_query(&self, table: &str, limit: u32) -> TableQuery {
		TableQuery::new(self.contract.as_str(), self.contract.as_str(), table, limit)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{body_partial_json, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn adopter_row(account: &str, score: u32) -> serde_json::Value {
		serde_json::json!({
			"account": account,
			"invitedby": "invitono",
			"lastupdated": 1714000000u64,
			"score": score,
			"claimed": false
		})
	}

	async fn reader_for(server: &MockServer) -> ContractReader {
		let rpc = RpcClient::new(&server.uri()).unwrap();
		ContractReader::new(rpc, AccountName::new("invitono").unwrap())
	}

	#[tokio::test]
	async fn fetch_adopter_returns_row_for_exact_key() {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(path("/v1/chain/get_table_rows"))
			.and(body_partial_json(serde_json::json!({
				"table": "adopters",
				"lower_bound": "alice",
				"upper_bound": "alice",
				"limit": 1
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"rows": [adopter_row("alice", 12)]
			})))
			.expect(1)
			.mount(&server)
			.await;

		let reader = reader_for(&server).await;
		let adopter = reader
			.fetch_adopter(&AccountName::new("alice").unwrap())
			.await
			.unwrap()
			.unwrap();

		assert_eq!(adopter.account.as_str(), "alice");
		assert_eq!(adopter.score, 12);
	}

	#[tokio::test]
	async fn fetch_adopter_missing_row_is_none_not_error() {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(path("/v1/chain/get_table_rows"))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(serde_json::json!({"rows": [], "more": false})),
			)
			.mount(&server)
			.await;

		let reader = reader_for(&server).await;
		let adopter = reader
			.fetch_adopter(&AccountName::new("nobody").unwrap())
			.await
			.unwrap();

		assert!(adopter.is_none());
	}

	#[tokio::test]
	async fn fetch_top_adopters_never_exceeds_limit() {
		let server = MockServer::start().await;

		// A misbehaving node returning more rows than requested.
		Mock::given(method("POST"))
			.and(path("/v1/chain/get_table_rows"))
			.and(body_partial_json(serde_json::json!({
				"index_position": "secondary",
				"key_type": "i64",
				"limit": 2
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"rows": [
					adopter_row("alice", 30),
					adopter_row("bob", 20),
					adopter_row("carol", 10)
				]
			})))
			.mount(&server)
			.await;

		let reader = reader_for(&server).await;
		let board = reader.fetch_top_adopters(2).await.unwrap();

		assert_eq!(board.len(), 2);
		assert!(board.windows(2).all(|w| w[0].score >= w[1].score));
	}

	#[tokio::test]
	async fn fetch_config_absent_is_none() {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(path("/v1/chain/get_table_rows"))
			.and(body_partial_json(serde_json::json!({"table": "config"})))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(serde_json::json!({"rows": [], "more": false})),
			)
			.mount(&server)
			.await;

		let reader = reader_for(&server).await;
		assert!(reader.fetch_config().await.unwrap().is_none());
	}

	#[tokio::test]
	async fn fetch_stats_decodes_singleton() {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(path("/v1/chain/get_table_rows"))
			.and(body_partial_json(serde_json::json!({"table": "stats"})))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"rows": [{
					"total_referrals": 120,
					"total_users": 48,
					"last_registered": "dave"
				}]
			})))
			.mount(&server)
			.await;

		let reader = reader_for(&server).await;
		let stats = reader.fetch_stats().await.unwrap().unwrap();
		assert_eq!(stats.total_users, 48);
		assert_eq!(stats.last_registered.as_str(), "dave");
	}

	#[tokio::test]
	async fn fetch_chain_id_reads_node_metadata() {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(path("/v1/chain/get_info"))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(serde_json::json!({"chain_id": "abc123"})),
			)
			.mount(&server)
			.await;

		let reader = reader_for(&server).await;
		assert_eq!(reader.fetch_chain_id().await.unwrap(), "abc123");
	}
}
