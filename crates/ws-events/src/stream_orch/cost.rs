#![cfg(feature = "stream-orch")]

//! Cost accounting (spec §4.6c): token estimation, a fixed per-tier price
//! table, and TTS character pricing. Unknown `tier` strings fall back to
//! `medium` (spec §9).

/// A coarse cost/quality band selecting chat/TTS model defaults and a
/// price row (spec GLOSSARY: "Tier").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
	Low,
	MediumLow,
	Medium,
	MediumHigh,
	High,
}

impl Tier {
	/// Parses a settings string, falling back to `Medium` for anything
	/// unrecognized rather than erroring (spec §9).
	#[must_use]
	pub fn parse(value: &str) -> Self {
		match value {
			"low" => Self::Low,
			"medium_low" => Self::MediumLow,
			"medium_high" => Self::MediumHigh,
			"high" => Self::High,
			_ => Self::Medium,
		}
	}

	/// `(input $/1k tokens, output $/1k tokens)`, per the table added in
	/// `SPEC_FULL.md` §4.6c.
	#[must_use]
	pub const fn prices_per_1k(self) -> (f64, f64) {
		match self {
			Self::Low => (0.000_15, 0.000_60),
			Self::MediumLow => (0.000_25, 0.001_00),
			Self::Medium => (0.000_50, 0.002_00),
			Self::MediumHigh => (0.001_00, 0.004_00),
			Self::High => (0.002_50, 0.010_00),
		}
	}
}

/// `tts-1` price per the spec's fixed table (§4.6c): $15 / 1M characters.
pub const TTS_PRICE_PER_MILLION_CHARS: f64 = 15.0;

/// `max(1, floor(len(text)/4))`, the token estimator named in spec §4.6c.
#[must_use]
pub fn estimate_tokens(text: &str) -> u32 {
	let len = text.chars().count();
	(len / 4).max(1) as u32
}

/// Chat cost for `tokens_in`/`tokens_out` at `tier`'s price row.
#[must_use]
pub fn chat_cost(tier: Tier, tokens_in: u32, tokens_out: u32) -> f64 {
	let (input_per_1k, output_per_1k) = tier.prices_per_1k();
	f64::from(tokens_in) / 1000.0 * input_per_1k + f64::from(tokens_out) / 1000.0 * output_per_1k
}

/// TTS cost for synthesizing `chars` characters of text, optionally added
/// to the chat cost to produce the assistant turn's total cost (spec
/// §4.6c: "TTS cost is optionally added").
#[must_use]
pub fn tts_cost(chars: usize) -> f64 {
	chars as f64 / 1_000_000.0 * TTS_PRICE_PER_MILLION_CHARS
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn token_estimate_rounds_down_and_floors_at_one() {
		assert_eq!(estimate_tokens(""), 1);
		assert_eq!(estimate_tokens("abc"), 1);
		assert_eq!(estimate_tokens("twelve char!"), 3);
	}

	#[test]
	fn unknown_tier_string_falls_back_to_medium() {
		assert_eq!(Tier::parse("ultra"), Tier::Medium);
		assert_eq!(Tier::parse("medium"), Tier::Medium);
	}

	#[test]
	fn chat_cost_uses_the_tiers_price_row() {
		let cost = chat_cost(Tier::Low, 1000, 1000);
		assert!((cost - (0.000_15 + 0.000_60)).abs() < 1e-12);
	}

	#[test]
	fn tts_cost_scales_with_characters() {
		let cost = tts_cost(1_000_000);
		assert!((cost - TTS_PRICE_PER_MILLION_CHARS).abs() < 1e-9);
	}
}
