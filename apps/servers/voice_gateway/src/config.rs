use clap::Parser;
use serde::{Deserialize, Serialize};

/// Process-wide configuration (spec §6, `SPEC_FULL.md` §10.3). One field
/// per environment variable named in spec.md §6, plus the ambient
/// concerns (`DATABASE_URL`, `RUST_LOG`, `LOG_JSON`, OTLP export) every
/// binary in this workspace carries.
#[derive(Parser, Clone, Debug, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct Config {
	/// OpenAI-compatible bearer credential for STT/chat/TTS/moderation.
	#[arg(long, env = "OPENAI_API_KEY", default_value = "")]
	pub openai_api_key: String,

	#[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
	pub openai_base_url: String,

	#[arg(long, env = "STT_MODEL", default_value = "whisper-1")]
	pub stt_model: String,

	#[arg(long, env = "CHAT_MODEL", default_value = "gpt-4o-mini")]
	pub chat_model: String,

	#[arg(long, env = "TTS_MODEL", default_value = "tts-1")]
	pub tts_model: String,

	#[arg(long, env = "TTS_VOICE", default_value = "alloy")]
	pub tts_voice: String,

	#[arg(long, env = "PORT", default_value = "8001")]
	pub port: u16,

	/// `*`, or a comma-separated allowlist (spec §6).
	#[arg(long, env = "CORS_ORIGINS", default_value = "*")]
	pub cors_origins: String,

	#[arg(long, env = "DATABASE_URL", default_value = "sqlite://voice_gateway.db")]
	pub database_url: String,

	#[arg(long, env = "RUST_LOG", default_value = "info")]
	pub rust_log: String,

	#[arg(long, env = "LOG_JSON", default_value = "false")]
	pub log_json: bool,

	/// Enables OTLP trace export when set (`SPEC_FULL.md` §10.1).
	#[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
	pub otel_exporter_otlp_endpoint: Option<String>,
}

impl Config {
	#[must_use]
	pub fn new() -> Self {
		Self::parse()
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			openai_api_key: String::new(),
			openai_base_url: "https://api.openai.com/v1".to_string(),
			stt_model: "whisper-1".to_string(),
			chat_model: "gpt-4o-mini".to_string(),
			tts_model: "tts-1".to_string(),
			tts_voice: "alloy".to_string(),
			port: 8001,
			cors_origins: "*".to_string(),
			database_url: "sqlite::memory:".to_string(),
			rust_log: "info".to_string(),
			log_json: false,
			otel_exporter_otlp_endpoint: None,
		}
	}
}
