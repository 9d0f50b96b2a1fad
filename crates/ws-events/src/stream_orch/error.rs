#![cfg(feature = "stream-orch")]

use std::fmt;

use thiserror::Error;

/// Error taxonomy for utterance-stage failures (spec §7). Each variant maps
/// 1:1 onto the `stage` tag carried by the `error{stage, message}` outbound
/// frame (see `session_fsm::OutboundEvent::Error`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
	RateLimit,
	Audio,
	Stt,
	Chat,
	Tts,
	Streaming,
	StopTts,
	Busy,
	General,
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Self::RateLimit => "rate_limit",
			Self::Audio => "audio",
			Self::Stt => "stt",
			Self::Chat => "chat",
			Self::Tts => "tts",
			Self::Streaming => "streaming",
			Self::StopTts => "stop_tts",
			Self::Busy => "busy",
			Self::General => "general",
		};
		f.write_str(s)
	}
}

/// A stage-scoped failure inside one utterance. Per spec §7, a stage error
/// terminates only the current utterance; the session stays `Idle`. This
/// type never unwinds a task — it is always returned as a plain `Err`.
#[derive(Debug, Error, Clone)]
#[error("{stage}: {message}")]
pub struct StageError {
	pub stage: Stage,
	pub message: String,
}

impl StageError {
	#[must_use]
	pub fn new(stage: Stage, message: impl Into<String>) -> Self {
		Self { stage, message: message.into() }
	}
}

pub type Result<T> = std::result::Result<T, StageError>;
