use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifies one accepted connection for the lifetime of its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
	#[must_use]
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for SessionId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for SessionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Passive counters surfaced by `get_metrics` and the admin status endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetrics {
	pub bytes_received: u64,
	pub chunks_received: u64,
	pub utterances_total: u64,
	pub stt_ms: u64,
	pub first_token_ms: u64,
	pub llm_ms: u64,
	pub tts_ms: u64,
	pub interruptions: u64,
	pub last_error: Option<String>,
	pub last_activity_ts: Option<DateTime<Utc>>,
}

/// Outcome of passing an inbound `audio_chunk` through the token bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
	Admitted,
	Denied,
}

/// What kicked off a new utterance, handed to the streaming orchestrator.
#[derive(Debug, Clone)]
pub enum UtteranceTrigger {
	Audio { bytes: Vec<u8>, prefer_short_answer: bool },
	Text { text: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
	#[error("a current utterance is already in progress")]
	Busy,
	#[error("session is closed")]
	Closed,
	#[error("invalid state transition: {from} -> {attempted}")]
	InvalidTransition { from: String, attempted: String },
	#[error("session actor unavailable")]
	ActorUnavailable,
}
