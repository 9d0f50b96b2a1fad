use serde::{Deserialize, Serialize};

use crate::types::SessionMetrics;

/// Events a client may send over the socket (spec §4.5).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
	Ping,
	AudioChunk {
		data: String,
	},
	AudioEnd {
		#[serde(default)]
		prefer_short_answer: bool,
	},
	UserText {
		text: String,
	},
	StopTts {
		#[serde(default)]
		reason: Option<String>,
	},
	GetMetrics,
}

/// Events the server may push to a client (spec §4.5).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
	Hello { ts: i64 },
	Pong { ts: i64 },
	ServerHeartbeat { ts: i64 },
	PartialTranscription { text: String },
	ResultStt { text: String, from: &'static str },
	LlmFirstToken { token: String, ts: i64 },
	LlmToken { token: String, accumulated: String },
	ResultLlm { text: String, from: &'static str },
	AudioChunk {
		audio: String,
		sequence_id: u32,
		text: String,
		tts_ms: u64,
		#[serde(rename = "final", skip_serializing_if = "std::ops::Not::not")]
		is_final: bool,
	},
	TtsChunkError { sequence_id: u32, text: String, error: String },
	TtsEnd { total_chunks: u32 },
	TtsCancelled { ts: i64, reason: String },
	PipelineComplete { total_chunks: u32 },
	Error { stage: String, message: String },
	Metrics(SessionMetrics),
}

#[must_use]
pub fn now_ts() -> i64 {
	chrono::Utc::now().timestamp_millis()
}
