//! Per-connection admission control for inbound audio chunks (spec C2).
//!
//! Unlike [`super::token_bucket::TokenBucketRateLimiter`] (an atomics-based
//! limiter fronting the admin HTTP surface), this bucket guards a single
//! session's inbound `audio_chunk` stream. It is deliberately a plain
//! `Mutex`-guarded float state machine: chunk admission happens on the
//! session's single event-handling task, so there is no contention to
//! optimise away, and floats make the "4 tokens/sec, burst of 8" cadence
//! exact instead of scaled-integer approximate.

use std::sync::Mutex;
use std::time::Instant;

/// Tokens/second for the default admission policy (matches a 250ms chunk
/// cadence with a small burst allowance).
pub const DEFAULT_RATE: f64 = 4.0;
/// Maximum burst capacity for the default admission policy.
pub const DEFAULT_CAPACITY: f64 = 8.0;

#[derive(Debug)]
struct BucketState {
	tokens: f64,
	last_refill: Instant,
}

/// A leaky/token bucket guarding admission of inbound events (spec §4.2).
///
/// `allow()` never blocks and never holds its lock across I/O: it refills,
/// checks, and releases in one critical section.
pub struct TokenBucket {
	rate: f64,
	capacity: f64,
	state: Mutex<BucketState>,
}

impl TokenBucket {
	#[must_use]
	pub fn new(rate: f64, capacity: f64) -> Self {
		Self {
			rate,
			capacity,
			state: Mutex::new(BucketState {
				tokens: capacity,
				last_refill: Instant::now(),
			}),
		}
	}

	/// Refill by `elapsed * rate` (clamped to capacity), then admit if at
	/// least one token is available.
	pub fn allow(&self) -> bool {
		let now = Instant::now();
		let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

		let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
		state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
		state.last_refill = now;

		if state.tokens >= 1.0 {
			state.tokens -= 1.0;
			true
		} else {
			false
		}
	}

	/// Current token count, for metrics/diagnostics. Performs the same
	/// refill as `allow()` but never consumes a token.
	pub fn tokens(&self) -> f64 {
		let now = Instant::now();
		let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
		let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
		state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
		state.last_refill = now;
		state.tokens
	}
}

impl Default for TokenBucket {
	fn default() -> Self {
		Self::new(DEFAULT_RATE, DEFAULT_CAPACITY)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::thread::sleep;
	use std::time::Duration;

	#[test]
	fn admits_up_to_capacity_as_a_burst() {
		let bucket = TokenBucket::new(4.0, 8.0);
		for _ in 0..8 {
			assert!(bucket.allow());
		}
		assert!(!bucket.allow(), "ninth chunk within the burst window must be denied");
	}

	#[test]
	fn refills_over_time() {
		let bucket = TokenBucket::new(4.0, 8.0);
		for _ in 0..8 {
			assert!(bucket.allow());
		}
		sleep(Duration::from_millis(300));
		// ~1.2 tokens should have refilled after 300ms at 4/s.
		assert!(bucket.allow());
	}

	#[test]
	fn default_matches_spec_cadence() {
		let bucket = TokenBucket::default();
		assert!((bucket.tokens() - DEFAULT_CAPACITY).abs() < f64::EPSILON);
	}
}
