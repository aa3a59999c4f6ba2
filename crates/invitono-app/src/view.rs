//! Terminal rendering of application state.
//!
//! Formatting is kept in pure functions returning strings so rendering is
//! testable; printing and coloring happen at the edge.

use crate::app::App;
use chrono::DateTime;
use colored::Colorize;
use invitono_types::{bonus_percent, referral_level, Adopter, ContractConfig, ContractStats};

/// Placeholder shown for any value the chain has not provided yet.
const PLACEHOLDER: &str = "-";

/// Formats an integer with thousands separators.
pub fn thousands(value: u64) -> String {
	let digits = value.to_string();
	let mut out = String::with_capacity(digits.len() + digits.len() / 3);
	for (i, c) in digits.chars().enumerate() {
		if i > 0 && (digits.len() - i) % 3 == 0 {
			out.push(',');
		}
		out.push(c);
	}
	out
}

/// Formats an epoch-seconds timestamp for display.
pub fn format_timestamp(seconds: u64) -> String {
	DateTime::from_timestamp(seconds as i64, 0)
		.map(|dt| dt.format("%b %d, %Y %H:%M UTC").to_string())
		.unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Key/value lines for the contract config card.
///
/// Every field renders a placeholder when the config row is absent; an
/// uninitialized contract must never render as an error.
pub fn config_lines(config: Option<&ContractConfig>) -> Vec<(String, String)> {
	match config {
		None => vec![
			("Status".to_string(), PLACEHOLDER.to_string()),
			("Invite cooldown".to_string(), PLACEHOLDER.to_string()),
			("Min account age".to_string(), PLACEHOLDER.to_string()),
			("Reward rate".to_string(), PLACEHOLDER.to_string()),
			("Reward token".to_string(), PLACEHOLDER.to_string()),
			("Admin".to_string(), PLACEHOLDER.to_string()),
		],
		Some(config) => vec![
			(
				"Status".to_string(),
				if config.enabled { "enabled" } else { "disabled" }.to_string(),
			),
			(
				"Invite cooldown".to_string(),
				format!("{} minutes", config.invite_rate_seconds / 60),
			),
			(
				"Min account age".to_string(),
				format!("{} days", config.min_account_age_days),
			),
			(
				// reward_rate is scaled by 100 on-chain.
				"Reward rate".to_string(),
				format!(
					"{:.2} {} per referral",
					config.reward_rate as f64 / 100.0,
					config.reward_symbol
				),
			),
			("Reward token".to_string(), config.token_contract.to_string()),
			("Admin".to_string(), config.admin.to_string()),
		],
	}
}

/// Key/value lines for the network stats card.
pub fn stats_lines(stats: Option<&ContractStats>) -> Vec<(String, String)> {
	match stats {
		None => vec![
			("Total referrals".to_string(), PLACEHOLDER.to_string()),
			("Total users".to_string(), PLACEHOLDER.to_string()),
			("Last registered".to_string(), PLACEHOLDER.to_string()),
		],
		Some(stats) => vec![
			("Total referrals".to_string(), thousands(stats.total_referrals)),
			("Total users".to_string(), thousands(stats.total_users)),
			("Last registered".to_string(), stats.last_registered.to_string()),
		],
	}
}

/// Key/value lines for the signed-in user's card.
pub fn user_lines(row: Option<&Adopter>) -> Vec<(String, String)> {
	match row {
		None => vec![("Referral score".to_string(), PLACEHOLDER.to_string())],
		Some(row) => {
			let level = referral_level(row.score);
			vec![
				("Referral score".to_string(), thousands(row.score as u64)),
				(
					"Level".to_string(),
					format!("Level {} · Bonus {}", level, bonus_percent(level)),
				),
				(
					"Claimed".to_string(),
					if row.claimed { "yes" } else { "no" }.to_string(),
				),
				("Invited by".to_string(), row.invitedby.to_string()),
				("Last updated".to_string(), format_timestamp(row.lastupdated)),
			]
		},
	}
}

/// One leaderboard table line per adopter: rank, account, score, level.
pub fn leaderboard_lines(board: &[Adopter]) -> Vec<String> {
	board
		.iter()
		.enumerate()
		.map(|(i, row)| {
			format!(
				"{:>3}  {:<12}  {:>10}  level {}",
				i + 1,
				row.account,
				thousands(row.score as u64),
				referral_level(row.score)
			)
		})
		.collect()
}

fn print_card(title: &str, lines: &[(String, String)]) {
	println!("\n{}", title.bold().cyan());
	for (key, value) in lines {
		println!("  {} {}", format!("{}:", key).bold(), value);
	}
}

/// Prints the full dashboard view.
pub fn print_dashboard(app: &App) {
	print_card("Contract", &config_lines(app.dashboard.config.as_ref()));
	print_card("Network", &stats_lines(app.dashboard.stats.as_ref()));
	print_card("Your referrals", &user_lines(app.user_row.as_ref()));

	println!("\n{}", "Leaderboard".bold().cyan());
	if app.dashboard.leaderboard.is_empty() {
		println!("  (no adopters yet)");
	} else {
		for line in leaderboard_lines(&app.dashboard.leaderboard) {
			println!("  {}", line);
		}
	}

	if let Some(feedback) = &app.feedback {
		println!("\n{} {}", "✓".green().bold(), feedback);
	}
	if let Some(error) = &app.error {
		eprintln!("\n{} {}", "✗".red().bold(), error.red());
	}
}
