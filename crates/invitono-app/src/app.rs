//! The application controller.
//!
//! Owns the session object and all view state, triggers reads on startup and
//! after every user action that may have changed on-chain state, and guards
//! every post-await state mutation with a cancellation flag so a late result
//! cannot write into a torn-down view.

use invitono_config::AppConfig;
use invitono_query::ContractReader;
use invitono_types::{referral_level, Adopter, ContractConfig, ContractStats};
use invitono_wallet::WalletService;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Cooperative cancellation flag.
///
/// Set on teardown and consulted before every state mutation that follows an
/// awaited call. In-flight requests are not aborted; their results are
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
	/// Creates an unset flag.
	pub fn new() -> Self {
		Self::default()
	}

	/// Marks the owner as torn down.
	pub fn cancel(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	/// Whether the owner has been torn down.
	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}
}

/// The user action currently in flight, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyAction {
	/// `redeeminvite` is being signed.
	Redeem,
	/// `claimreward` is being signed.
	Claim,
}

/// Snapshot of the three concurrent dashboard reads.
///
/// Updated only when all three resolve; a single failure leaves the previous
/// snapshot in place and lands in the error slot instead.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
	/// The contract's config row, absent until initialized on-chain.
	pub config: Option<ContractConfig>,
	/// The contract's stats row.
	pub stats: Option<ContractStats>,
	/// Leaderboard rows, non-increasing by score.
	pub leaderboard: Vec<Adopter>,
}

/// Top-level application controller.
pub struct App {
	reader: ContractReader,
	wallet: Arc<WalletService>,
	leaderboard_limit: u32,
	cancel: CancelFlag,
	/// Dashboard snapshot.
	pub dashboard: Dashboard,
	/// The signed-in user's adopter row, if registered.
	pub user_row: Option<Adopter>,
	/// Action currently in flight.
	pub busy: Option<BusyAction>,
	/// Last success message.
	pub feedback: Option<String>,
	/// Single-slot error display.
	pub error: Option<String>,
	/// Bumped once per completed state-changing action or manual refresh;
	/// every bump re-runs all reads.
	pub refresh_count: u64,
}

impl App {
	/// Creates a controller over the given reader and wallet session.
	pub fn new(config: &AppConfig, reader: ContractReader, wallet: Arc<WalletService>) -> Self {
		Self {
			reader,
			wallet,
			leaderboard_limit: config.leaderboard_limit,
			cancel: CancelFlag::new(),
			dashboard: Dashboard::default(),
			user_row: None,
			busy: None,
			feedback: None,
			error: None,
			refresh_count: 0,
		}
	}

	/// A handle to this controller's cancellation flag, for teardown.
	pub fn cancel_flag(&self) -> CancelFlag {
		self.cancel.clone()
	}

	/// The wallet session this controller drives.
	pub fn wallet(&self) -> &Arc<WalletService> {
		&self.wallet
	}

	/// Issues the three dashboard reads concurrently and applies them
	/// atomically once all have resolved.
	pub async fn load_dashboard(&mut self) {
		let result = tokio::try_join!(
			self.reader.fetch_config(),
			self.reader.fetch_stats(),
			self.reader.fetch_top_adopters(self.leaderboard_limit),
		);

		if self.cancel.is_cancelled() {
			debug!("Dropping dashboard result after teardown");
			return;
		}

		match result {
			Ok((config, stats, leaderboard)) => {
				self.dashboard = Dashboard {
					config,
					stats,
					leaderboard,
				};
			},
			Err(err) => self.error = Some(err.to_string()),
		}
	}

	/// Loads the signed-in user's adopter row, keyed off the resolved
	/// account. Clears the row when no account is resolved.
	pub async fn load_user_row(&mut self) {
		let Some(account) = self.wallet.account().await else {
			self.user_row = None;
			return;
		};

		let result = self.reader.fetch_adopter(&account).await;

		if self.cancel.is_cancelled() {
			debug!("Dropping adopter result after teardown");
			return;
		}

		match result {
			Ok(row) => self.user_row = row,
			Err(err) => self.error = Some(err.to_string()),
		}
	}

	/// Redeems a referral invite from `inviter_input`.
	///
	/// Validates the input locally, delegates signing to the wallet, and on
	/// success bumps the refresh counter exactly once.
	pub async fn redeem_invite(&mut self, inviter_input: &str) {
		self.feedback = None;
		self.error = None;

		let Some(user) = self.wallet.account().await else {
			self.error = Some("Log in with your wallet before redeeming an invite.".to_string());
			return;
		};

		if inviter_input.trim().is_empty() {
			self.error = Some("Enter the inviter account name you received.".to_string());
			return;
		}

		let inviter = match inviter_input.parse::<invitono_types::AccountName>() {
			Ok(inviter) => inviter,
			Err(err) => {
				self.error = Some(err.to_string());
				return;
			},
		};

		self.busy = Some(BusyAction::Redeem);
		let result = self
			.wallet
			.sign_transaction(
				"redeeminvite",
				serde_json::json!({
					"user": user.as_str(),
					"inviter": inviter.as_str(),
				}),
			)
			.await;

		if self.cancel.is_cancelled() {
			return;
		}
		self.busy = None;

		match result {
			Ok(()) => {
				self.feedback = Some("Invite redeemed. Scores will refresh shortly.".to_string());
				self.refresh_count += 1;
			},
			Err(err) => self.error = Some(err.to_string()),
		}
	}

	/// Claims the accumulated referral reward.
	pub async fn claim_reward(&mut self) {
		self.feedback = None;
		self.error = None;

		let Some(user) = self.wallet.account().await else {
			self.error = Some("Log in with your wallet before claiming rewards.".to_string());
			return;
		};

		self.busy = Some(BusyAction::Claim);
		let result = self
			.wallet
			.sign_transaction("claimreward", serde_json::json!({"user": user.as_str()}))
			.await;

		if self.cancel.is_cancelled() {
			return;
		}
		self.busy = None;

		match result {
			Ok(()) => {
				self.feedback = Some("Rewards claimed. Check your wallet balance.".to_string());
				self.refresh_count += 1;
			},
			Err(err) => self.error = Some(err.to_string()),
		}
	}

	/// Manual refresh trigger; the caller re-runs the reads afterwards.
	pub fn refresh(&mut self) {
		self.refresh_count += 1;
	}

	/// Referral level of the signed-in user, zero when unregistered.
	pub fn user_level(&self) -> usize {
		self.user_row
			.as_ref()
			.map(|row| referral_level(row.score))
			.unwrap_or(0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use invitono_query::RpcClient;
	use invitono_types::AccountName;
	use invitono_wallet::implementations::memory::{MemoryNavigator, MemoryProvider};
	use invitono_wallet::PageLocation;
	use wiremock::matchers::{body_partial_json, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn account(name: &str) -> AccountName {
		AccountName::new(name).unwrap()
	}

	fn test_config(endpoint: &str) -> AppConfig {
		AppConfig::from_lookup(|key| match key {
			invitono_config::ENV_RPC_ENDPOINT => Some(endpoint.to_string()),
			invitono_config::ENV_LEADERBOARD_LIMIT => Some("3".to_string()),
			_ => None,
		})
		.unwrap()
	}

	fn wallet_with_session(signed_in: Option<&str>) -> (Arc<MemoryProvider>, Arc<WalletService>) {
		let provider = Arc::new(MemoryProvider::new());
		if let Some(name) = signed_in {
			let did = format!("did:key:{}", name);
			provider.register_account(&did, account(name));
			provider.seed_session(&did);
		}
		let navigator = Arc::new(MemoryNavigator::new(PageLocation::new(
			"https://invite.example.com",
			"/",
		)));
		let wallet = Arc::new(WalletService::new(
			provider.clone(),
			navigator,
			account("invitono"),
			"https://accounts.example.com",
		));
		(provider, wallet)
	}

	async fn app_for(server: &MockServer, signed_in: Option<&str>) -> (Arc<MemoryProvider>, App) {
		let config = test_config(&server.uri());
		let rpc = RpcClient::new(&config.rpc_endpoint).unwrap();
		let reader = ContractReader::new(rpc, config.contract_account.clone());
		let (provider, wallet) = wallet_with_session(signed_in);
		wallet.initialize().await;
		(provider, App::new(&config, reader, wallet))
	}

	fn adopter_row(name: &str, score: u32) -> serde_json::Value {
		serde_json::json!({
			"account": name,
			"invitedby": "invitono",
			"lastupdated": 1714000000u64,
			"score": score,
			"claimed": false
		})
	}

	async fn mount_empty_tables(server: &MockServer) {
		Mock::given(method("POST"))
			.and(path("/v1/chain/get_table_rows"))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(serde_json::json!({"rows": [], "more": false})),
			)
			.mount(server)
			.await;
	}

	#[tokio::test]
	async fn dashboard_loads_all_three_reads() {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(path("/v1/chain/get_table_rows"))
			.and(body_partial_json(serde_json::json!({"table": "config"})))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"rows": [{
					"min_account_age_days": 7,
					"invite_rate_seconds": 600,
					"enabled": true,
					"admin": "invitono",
					"max_referral_depth": 5,
					"multiplier": 2,
					"token_contract": "eosio.token",
					"reward_symbol": "BLUX",
					"reward_rate": 150
				}]
			})))
			.mount(&server)
			.await;

		Mock::given(method("POST"))
			.and(path("/v1/chain/get_table_rows"))
			.and(body_partial_json(serde_json::json!({"table": "stats"})))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"rows": [{
					"total_referrals": 10,
					"total_users": 4,
					"last_registered": "dave"
				}]
			})))
			.mount(&server)
			.await;

		Mock::given(method("POST"))
			.and(path("/v1/chain/get_table_rows"))
			.and(body_partial_json(serde_json::json!({"table": "adopters"})))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"rows": [adopter_row("alice", 30), adopter_row("bob", 20)]
			})))
			.mount(&server)
			.await;

		let (_, mut app) = app_for(&server, None).await;
		app.load_dashboard().await;

		assert!(app.error.is_none());
		assert_eq!(app.dashboard.config.as_ref().unwrap().reward_symbol, "BLUX");
		assert_eq!(app.dashboard.stats.as_ref().unwrap().total_users, 4);
		assert_eq!(app.dashboard.leaderboard.len(), 2);
	}

	#[tokio::test]
	async fn dashboard_read_failure_lands_in_error_slot() {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(path("/v1/chain/get_table_rows"))
			.respond_with(ResponseTemplate::new(500).set_body_string("unavailable"))
			.mount(&server)
			.await;

		let (_, mut app) = app_for(&server, None).await;
		app.load_dashboard().await;

		assert!(app.error.is_some());
		assert!(app.dashboard.config.is_none());
		assert!(app.dashboard.leaderboard.is_empty());
	}

	#[tokio::test]
	async fn cancelled_app_drops_late_results() {
		let server = MockServer::start().await;
		mount_empty_tables(&server).await;

		let (_, mut app) = app_for(&server, None).await;
		app.dashboard.leaderboard = vec![];
		app.cancel_flag().cancel();
		app.load_dashboard().await;

		// No mutation after teardown, including the error slot.
		assert!(app.error.is_none());
	}

	#[tokio::test]
	async fn user_row_is_cleared_when_signed_out() {
		let server = MockServer::start().await;
		mount_empty_tables(&server).await;

		let (_, mut app) = app_for(&server, None).await;
		app.user_row = Some(serde_json::from_value(adopter_row("alice", 5)).unwrap());
		app.load_user_row().await;

		assert!(app.user_row.is_none());
	}

	#[tokio::test]
	async fn redeem_bumps_refresh_count_exactly_once() {
		let server = MockServer::start().await;
		let (provider, mut app) = app_for(&server, Some("alice")).await;

		app.redeem_invite("bob").await;

		assert_eq!(app.refresh_count, 1);
		assert!(app.error.is_none());
		assert!(app.feedback.is_some());
		assert!(app.busy.is_none());

		let actions = provider.signed_actions();
		assert_eq!(actions.len(), 1);
		assert_eq!(actions[0].action, "redeeminvite");
		assert_eq!(actions[0].payload["user"], "alice");
		assert_eq!(actions[0].payload["inviter"], "bob");
	}

	#[tokio::test]
	async fn redeem_with_empty_inviter_is_a_validation_error() {
		let server = MockServer::start().await;
		let (provider, mut app) = app_for(&server, Some("alice")).await;

		app.redeem_invite("   ").await;

		assert_eq!(app.refresh_count, 0);
		assert!(app.error.as_ref().unwrap().contains("inviter"));
		assert!(provider.signed_actions().is_empty());
	}

	#[tokio::test]
	async fn redeem_with_malformed_inviter_is_a_validation_error() {
		let server = MockServer::start().await;
		let (provider, mut app) = app_for(&server, Some("alice")).await;

		app.redeem_invite("NOT~VALID").await;

		assert_eq!(app.refresh_count, 0);
		assert!(app.error.is_some());
		assert!(provider.signed_actions().is_empty());
	}

	#[tokio::test]
	async fn redeem_without_session_does_not_sign() {
		let server = MockServer::start().await;
		let (provider, mut app) = app_for(&server, None).await;

		app.redeem_invite("bob").await;

		assert_eq!(app.refresh_count, 0);
		assert!(app.error.as_ref().unwrap().contains("Log in"));
		assert!(provider.signed_actions().is_empty());
	}

	#[tokio::test]
	async fn claim_bumps_refresh_count_exactly_once() {
		let server = MockServer::start().await;
		let (provider, mut app) = app_for(&server, Some("alice")).await;

		app.claim_reward().await;

		assert_eq!(app.refresh_count, 1);
		assert!(app.feedback.is_some());
		let actions = provider.signed_actions();
		assert_eq!(actions.len(), 1);
		assert_eq!(actions[0].action, "claimreward");
	}

	#[tokio::test]
	async fn signing_failure_surfaces_without_refresh() {
		use invitono_wallet::{IdentityHandle, MockIdentityProvider, WalletError};

		let mut provider = MockIdentityProvider::new();
		provider
			.expect_restore_session()
			.returning(|_| Ok(Some(IdentityHandle::new("did:key:alice"))));
		provider
			.expect_account_name()
			.returning(|_| Ok(AccountName::new("alice").unwrap()));
		provider
			.expect_sign_transaction()
			.returning(|_, _, _, _| Err(WalletError::Network("wallet unreachable".to_string())));

		let server = MockServer::start().await;
		let config = test_config(&server.uri());
		let rpc = RpcClient::new(&config.rpc_endpoint).unwrap();
		let reader = ContractReader::new(rpc, config.contract_account.clone());
		let navigator = Arc::new(MemoryNavigator::new(PageLocation::new(
			"https://invite.example.com",
			"/",
		)));
		let wallet = Arc::new(WalletService::new(
			Arc::new(provider),
			navigator,
			account("invitono"),
			"https://accounts.example.com",
		));
		wallet.initialize().await;

		let mut app = App::new(&config, reader, wallet);
		app.claim_reward().await;

		assert_eq!(app.refresh_count, 0);
		assert!(app.error.as_ref().unwrap().contains("wallet unreachable"));
		assert!(app.feedback.is_none());
	}

	#[tokio::test]
	async fn manual_refresh_bumps_counter() {
		let server = MockServer::start().await;
		let (_, mut app) = app_for(&server, None).await;

		app.refresh();
		app.refresh();
		assert_eq!(app.refresh_count, 2);
	}

	#[tokio::test]
	async fn user_level_follows_threshold_table() {
		let server = MockServer::start().await;
		let (_, mut app) = app_for(&server, None).await;

		assert_eq!(app.user_level(), 0);
		app.user_row = Some(serde_json::from_value(adopter_row("alice", 4)).unwrap());
		assert_eq!(app.user_level(), 2);
	}
}
