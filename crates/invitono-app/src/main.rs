//! Terminal entry point for the Invitono referral client.
//!
//! Read commands (`dashboard`, `adopter`, `info`) query the configured RPC
//! endpoint directly. The `demo` command drives the full redirect login,
//! redeem, and claim cycle against the in-process identity provider, which
//! is the headless stand-in for the hosted wallet.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use invitono_app::view;
use invitono_app::App;
use invitono_config::AppConfig;
use invitono_query::{ContractReader, RpcClient};
use invitono_types::AccountName;
use invitono_wallet::implementations::memory::{MemoryNavigator, MemoryProvider};
use invitono_wallet::{PageLocation, SessionState, WalletService, PARAM_PAYLOAD, PARAM_SUCCESS};
use std::sync::Arc;

/// Command-line arguments for the Invitono client.
#[derive(Parser, Debug)]
#[command(name = "invitono", about = "Invitono referral contract client", version)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Override the configured RPC endpoint URL
	#[arg(long)]
	rpc_endpoint: Option<String>,

	/// Override the configured contract account
	#[arg(long)]
	contract: Option<String>,

	/// Override the configured leaderboard row limit
	#[arg(long)]
	limit: Option<u32>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "warn")]
	log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Show contract config, stats and the leaderboard (default)
	Dashboard,
	/// Look up a single adopter by account name
	Adopter {
		/// Account name to look up
		account: String,
	},
	/// Show chain metadata reported by the RPC endpoint
	Info,
	/// Run the login/redeem/claim cycle against the in-process wallet
	Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	use tracing_subscriber::{fmt, EnvFilter};
	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
	fmt().with_env_filter(env_filter).with_target(true).init();

	let mut config = AppConfig::from_env().context("loading configuration")?;
	if let Some(endpoint) = &cli.rpc_endpoint {
		config.rpc_endpoint = endpoint.trim_end_matches('/').to_string();
	}
	if let Some(contract) = &cli.contract {
		config.contract_account = contract
			.parse::<AccountName>()
			.context("parsing --contract")?;
	}
	if let Some(limit) = cli.limit {
		config.leaderboard_limit = limit;
	}

	let rpc = RpcClient::new(&config.rpc_endpoint)?;
	let reader = ContractReader::new(rpc, config.contract_account.clone());

	match cli.command.unwrap_or(Commands::Dashboard) {
		Commands::Dashboard => dashboard(&config, reader).await,
		Commands::Adopter { account } => adopter(&reader, &account).await,
		Commands::Info => info(&config, &reader).await,
		Commands::Demo => demo(&config, reader).await,
	}
}

async fn dashboard(config: &AppConfig, reader: ContractReader) -> Result<()> {
	let wallet = headless_wallet(config);
	wallet.initialize().await;

	let mut app = App::new(config, reader, wallet);
	app.load_dashboard().await;
	app.load_user_row().await;

	view::print_dashboard(&app);
	Ok(())
}

async fn adopter(reader: &ContractReader, account: &str) -> Result<()> {
	let account = account.parse::<AccountName>().context("parsing account name")?;

	match reader.fetch_adopter(&account).await? {
		None => println!("{} is not registered.", account),
		Some(row) => {
			println!("{}", account.to_string().bold().cyan());
			for (key, value) in view::user_lines(Some(&row)) {
				println!("  {} {}", format!("{}:", key).bold(), value);
			}
		},
	}
	Ok(())
}

async fn info(config: &AppConfig, reader: &ContractReader) -> Result<()> {
	let chain_id = reader.fetch_chain_id().await?;
	println!("{} {}", "Chain id:".bold(), chain_id);

	if chain_id != config.chain_id {
		println!(
			"{} endpoint chain id differs from configured {}",
			"⚠".yellow().bold(),
			config.chain_id
		);
	}
	Ok(())
}

/// Walks the two-phase SSO protocol end to end against the in-process
/// provider: request phase, wallet approval, callback phase on a fresh
/// service, then a redeem and a claim through the authenticated session.
async fn demo(config: &AppConfig, reader: ContractReader) -> Result<()> {
	const DEMO_DID: &str = "did:key:demo";
	let origin = "https://invite.local";

	let provider = Arc::new(MemoryProvider::new());
	provider.register_account(DEMO_DID, "demo".parse::<AccountName>()?);

	let navigator = Arc::new(MemoryNavigator::new(PageLocation::new(origin, "/")));

	// Request phase.
	let wallet = WalletService::new(
		provider.clone(),
		navigator.clone(),
		config.contract_account.clone(),
		config.sso_origin.clone(),
	);
	wallet.initialize().await;
	wallet.login().await?;
	let redirect = navigator.navigations().pop().unwrap_or_default();
	println!("{} redirected to {}", "→".bold(), redirect);

	// The wallet approves and sends the browser back to the callback path.
	let response = provider.approve_pending(DEMO_DID)?;
	navigator.set_location(
		PageLocation::new(origin, "/")
			.with_param(PARAM_PAYLOAD, &response)
			.with_param(PARAM_SUCCESS, "true"),
	);

	// Callback phase, as on a fresh page load.
	let wallet = Arc::new(WalletService::new(
		provider.clone(),
		navigator.clone(),
		config.contract_account.clone(),
		config.sso_origin.clone(),
	));
	let state = wallet.initialize().await;
	anyhow::ensure!(
		state == SessionState::Authenticated,
		"expected an authenticated session, got {:?}",
		state
	);
	let account = wallet.account().await.context("account name not resolved")?;
	println!("{} logged in as {}", "✓".green().bold(), account);

	let mut app = App::new(config, reader, wallet);
	app.redeem_invite("invitono").await;
	app.claim_reward().await;

	if let Some(error) = &app.error {
		println!("{} {}", "✗".red().bold(), error);
	}
	println!(
		"{} signed {} action(s), refresh counter at {}",
		"✓".green().bold(),
		provider.signed_actions().len(),
		app.refresh_count
	);
	for action in provider.signed_actions() {
		println!("  {} {} {}", action.contract, action.action.bold(), action.payload);
	}

	app.wallet().logout().await;
	println!("{} logged out", "✓".green().bold());
	Ok(())
}

fn headless_wallet(config: &AppConfig) -> Arc<WalletService> {
	let provider = Arc::new(MemoryProvider::new());
	let navigator = Arc::new(MemoryNavigator::new(PageLocation::new(
		"https://invite.local",
		"/",
	)));
	Arc::new(WalletService::new(
		provider,
		navigator,
		config.contract_account.clone(),
		config.sso_origin.clone(),
	))
}
