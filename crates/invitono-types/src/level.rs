//! Referral-level math.
//!
//! The contract rewards referrals in tiers. A score maps to a level through a
//! fixed ascending threshold table (tetrahedral numbers); the level is the
//! index of the first threshold strictly greater than the score. The final
//! entry is a sentinel standing in for infinity so every score lands on some
//! index.

/// Ascending score thresholds for each referral level.
pub const REFERRAL_THRESHOLDS: [u32; 25] = [
	1, 4, 10, 20, 35, 56, 84, 120, 165, 220, 286, 364, 455, 560, 680, 816, 969, 1140, 1330, 1540,
	1771, 2024, 2300, 2600, 999_999_999,
];

/// Computes the referral level for a score.
///
/// Returns the smallest index `i` with `REFERRAL_THRESHOLDS[i] > score`;
/// scores at or beyond the last finite threshold map to the last index.
pub fn referral_level(score: u32) -> usize {
	REFERRAL_THRESHOLDS
		.iter()
		.position(|&threshold| threshold > score)
		.unwrap_or(REFERRAL_THRESHOLDS.len() - 1)
}

/// Reward bonus percentage for a level, as displayed to the user.
pub fn bonus_percent(level: usize) -> String {
	format!("{}%", level)
}
