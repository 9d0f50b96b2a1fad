#![cfg(feature = "stream-orch")]

/// How TTS audio chunks are delivered to the client within one utterance
/// (spec §4.6b). Completion order is the default: lowest latency, the
/// client reorders using `sequence_id`. In-order mode buffers completed
/// chunks and releases them only once every lower `sequence_id` has been
/// emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOrder {
	Completion,
	InOrder,
}

impl Default for DeliveryOrder {
	fn default() -> Self {
		Self::Completion
	}
}

/// Per-utterance configuration handed to the orchestrator: a snapshot of
/// the session's settings (spec §4.6), plus local knobs that are not part
/// of the wire-visible settings surface (pool size, delivery order).
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
	/// `STT_MODEL` (spec §6): a process-wide environment setting, not a
	/// settings-store key, so it is not touched by `from_settings` and
	/// must be filled in by the caller (`voice_gateway::websocket`) from
	/// its own `Config`.
	pub stt_model: String,
	pub chat_model: String,
	pub tts_model: String,
	pub voice: String,
	pub system_prompt: Option<String>,
	pub max_tokens_out: u32,
	pub temperature: f32,
	pub tier: super::cost::Tier,
	pub tts_pool_size: usize,
	pub delivery: DeliveryOrder,
	pub moderation_enabled: bool,
}

/// Default pool size for the bounded TTS worker pool (spec §4.6b).
pub const DEFAULT_TTS_POOL_SIZE: usize = 4;
/// Minimum sentence length (trimmed) required to dispatch TTS (spec §4.6
/// step 4, `MIN_SENTENCE_LENGTH`).
pub const MIN_SENTENCE_LENGTH: usize = 10;
/// Long-run safety break: force a sentence boundary once the buffer grows
/// past this many characters without a delimiter (spec §4.6a).
pub const SENTENCE_SAFETY_BREAK_CHARS: usize = 100;

impl Default for OrchestratorConfig {
	fn default() -> Self {
		Self {
			stt_model: "whisper-1".to_string(),
			chat_model: "gpt-4o-mini".to_string(),
			tts_model: "tts-1".to_string(),
			voice: "alloy".to_string(),
			system_prompt: None,
			max_tokens_out: 512,
			temperature: 0.7,
			tier: super::cost::Tier::Medium,
			tts_pool_size: DEFAULT_TTS_POOL_SIZE,
			delivery: DeliveryOrder::default(),
			moderation_enabled: false,
		}
	}
}

impl OrchestratorConfig {
	/// Builds a config from a settings snapshot (spec §6 recognized keys),
	/// falling back to spec-mandated defaults for anything missing or
	/// unparsable. Unknown `tier` values fall back to `medium` (spec §9
	/// "Dynamic dispatch over settings.tier").
	#[must_use]
	pub fn from_settings(settings: &std::collections::HashMap<String, String>) -> Self {
		let defaults = Self::default();
		Self {
			chat_model: settings.get("chat_model").cloned().unwrap_or(defaults.chat_model),
			tts_model: settings.get("tts_model").cloned().unwrap_or(defaults.tts_model),
			voice: settings.get("voice_name").cloned().unwrap_or(defaults.voice),
			system_prompt: settings.get("system_prompt").cloned(),
			max_tokens_out: settings.get("max_tokens_out").and_then(|v| v.parse().ok()).unwrap_or(defaults.max_tokens_out),
			temperature: settings.get("temperature").and_then(|v| v.parse().ok()).unwrap_or(defaults.temperature),
			tier: settings.get("tier").map(|t| super::cost::Tier::parse(t)).unwrap_or(defaults.tier),
			..defaults
		}
	}
}
