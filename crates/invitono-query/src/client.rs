//! Low-level RPC client for the chain's HTTP JSON interface.

use crate::QueryError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Timeout applied to every RPC request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters for a `get_table_rows` call.
///
/// All record types share this one request shape; the row type only enters
/// the picture when the response is decoded.
#[derive(Debug, Clone, Serialize)]
pub struct TableQuery {
	/// Account the contract code is deployed under.
	pub code: String,
	/// Table scope, conventionally the contract account itself.
	pub scope: String,
	/// Table name.
	pub table: String,
	/// Request JSON-decoded rows rather than raw ABI bytes.
	pub json: bool,
	/// Inclusive lower bound on the lookup key.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub lower_bound: Option<String>,
	/// Inclusive upper bound on the lookup key.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub upper_bound: Option<String>,
	/// Maximum number of rows to return.
	pub limit: u32,
	/// Secondary index selector, e.g. `"secondary"` for the first secondary
	/// index.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub index_position: Option<String>,
	/// Key type of the selected index, e.g. `"i64"`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub key_type: Option<String>,
}

impl TableQuery {
	/// Creates a primary-index query over `table` in the given code/scope.
	pub fn new(code: &str, scope: &str, table: &str, limit: u32) -> Self {
		Self {
			code: code.to_string(),
			scope: scope.to_string(),
			table: table.to_string(),
			json: true,
			lower_bound: None,
			upper_bound: None,
			limit,
			index_position: None,
			key_type: None,
		}
	}

	/// Pins the query to a single exact key.
	pub fn exact_key(mut self, key: &str) -> Self {
		self.lower_bound = Some(key.to_string());
		self.upper_bound = Some(key.to_string());
		self
	}

	/// Selects a secondary index with the given key type.
	pub fn secondary_index(mut self, key_type: &str) -> Self {
		self.index_position = Some("secondary".to_string());
		self.key_type = Some(key_type.to_string());
		self
	}
}

/// Response envelope for `get_table_rows`.
#[derive(Debug, Deserialize)]
pub struct TableRowsResponse<T> {
	/// Decoded rows, up to the requested limit.
	pub rows: Vec<T>,
	/// Whether more rows exist past the returned page.
	#[serde(default)]
	pub more: bool,
}

/// Node metadata from `get_info`. Only the fields the client consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainInfo {
	/// Identifier of the chain the node is serving.
	pub chain_id: String,
	/// Current head block height, when the node reports one.
	#[serde(default)]
	pub head_block_num: Option<u64>,
}

/// HTTP client for the chain's `v1/chain` query interface.
#[derive(Debug, Clone)]
pub struct RpcClient {
	client: reqwest::Client,
	endpoint: String,
}

impl RpcClient {
	/// Creates a client for the given RPC endpoint base URL.
	pub fn new(endpoint: &str) -> Result<Self, QueryError> {
		let client = reqwest::Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.build()
			.map_err(|e| QueryError::Network(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			endpoint: endpoint.trim_end_matches('/').to_string(),
		})
	}

	/// Reads a page of table rows and decodes each row as `T`.
	pub async fn get_table_rows<T: DeserializeOwned>(
		&self,
		query: &TableQuery,
	) -> Result<Vec<T>, QueryError> {
		debug!(
			table = %query.table,
			code = %query.code,
			limit = query.limit,
			"Fetching table rows"
		);

		let response: TableRowsResponse<T> =
			self.post("/v1/chain/get_table_rows", Some(query)).await?;
		Ok(response.rows)
	}

	/// Reads node metadata.
	pub async fn get_info(&self) -> Result<ChainInfo, QueryError> {
		self.post::<(), ChainInfo>("/v1/chain/get_info", None).await
	}

	async fn post<B: Serialize, T: DeserializeOwned>(
		&self,
		path: &str,
		body: Option<&B>,
	) -> Result<T, QueryError> {
		let url = format!("{}{}", self.endpoint, path);

		let mut request = self.client.post(&url);
		if let Some(body) = body {
			request = request.json(body);
		}

		let response = request
			.send()
			.await
			.map_err(|e| QueryError::Network(format!("RPC request to {} failed: {}", path, e)))?;

		if !response.status().is_success() {
			let status = response.status();
			let text = response.text().await.unwrap_or_default();
			return Err(QueryError::Network(format!(
				"RPC request to {} failed with status {}: {}",
				path, status, text
			)));
		}

		response
			.json::<T>()
			.await
			.map_err(|e| QueryError::InvalidData(format!("Failed to decode {} response: {}", path, e)))
	}
}
