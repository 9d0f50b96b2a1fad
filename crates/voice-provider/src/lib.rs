//! Provider Adapter (spec C4, §4.4): a thin HTTP client abstraction over
//! the three upstream language-model services the core treats as external
//! collaborators (spec §1) — speech-to-text, streaming chat completion,
//! and text-to-speech — plus an optional moderation endpoint.
//!
//! The default implementation, [`HttpProvider`], speaks the
//! OpenAI-compatible wire format used by `original_source`
//! (`backend/app/api/stt.py`, `chat.py`, `tts.py`): bearer auth,
//! `multipart/form-data` for audio upload, `application/json` everywhere
//! else, and `text/event-stream` (`data: {...}\n\n`, terminated by
//! `data: [DONE]`) for chat streaming.

pub mod error;
pub mod http_provider;
pub mod testing;
pub mod types;

pub use error::ProviderError;
pub use http_provider::{HttpProvider, ProviderConfig};
pub use types::{ChatMessage, ModerationResult, Role, TokenStream};

use async_trait::async_trait;

/// Default request-establishment timeout for all provider calls (spec §4.4
/// / §5: "Default timeouts: provider calls 60 s").
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
	/// `transcribe(audio_bytes) -> text`. Returns `""` on a non-2xx
	/// response rather than erroring, per spec §4.4. `model` is the
	/// `STT_MODEL` configured for the process (spec §6), not a
	/// settings-store value.
	async fn transcribe(&self, model: &str, audio_bytes: &[u8]) -> Result<String, ProviderError>;

	/// Non-streaming chat completion.
	async fn chat(&self, model: &str, messages: &[ChatMessage], max_tokens: u32, temperature: f32) -> Result<String, ProviderError>;

	/// Streaming chat completion: a finite, non-restartable, producer-paced
	/// sequence of text fragments in arrival order.
	async fn chat_stream(&self, model: &str, messages: &[ChatMessage], max_tokens: u32, temperature: f32) -> Result<TokenStream, ProviderError>;

	/// `synthesize(model, voice, text) -> audio_bytes`. Returns an empty
	/// byte vector on non-2xx, per spec §4.4.
	async fn synthesize(&self, model: &str, voice: &str, text: &str) -> Result<Vec<u8>, ProviderError>;

	/// Optional moderation. Implementations that don't support it should
	/// return `Ok(ModerationResult::safe())`; callers apply fail-open
	/// themselves on `Err` (spec: "Fail-open: on any error the content is
	/// treated as safe and a warning is logged").
	async fn moderate(&self, text: &str) -> Result<ModerationResult, ProviderError>;
}

/// Calls `moderate` and applies the fail-open policy from spec §4.4/§7:
/// any error is treated as "safe" and logged as a warning, never
/// propagated to the caller.
pub async fn moderate_fail_open(provider: &dyn ProviderAdapter, text: &str) -> ModerationResult {
	match provider.moderate(text).await {
		Ok(result) => result,
		Err(e) => {
			tracing::warn!(error = %e, "moderation call failed, treating content as safe (fail-open)");
			ModerationResult::safe()
		}
	}
}
