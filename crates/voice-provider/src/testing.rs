//! In-memory [`ProviderAdapter`] double used by session/orchestrator unit
//! tests (see `SPEC_FULL.md` §10.4). Never performs real HTTP calls.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::ProviderError;
use crate::types::{ChatMessage, ModerationResult, TokenStream};
use crate::ProviderAdapter;

pub struct FakeProvider {
	pub transcribe_result: String,
	pub chat_tokens: Mutex<Vec<String>>,
	pub synth_bytes: Vec<u8>,
	pub moderation: ModerationResult,
	pub fail_transcribe: bool,
	last_chat_messages: Mutex<Vec<ChatMessage>>,
}

impl FakeProvider {
	#[must_use]
	pub fn new() -> Self {
		Self {
			transcribe_result: String::new(),
			chat_tokens: Mutex::new(Vec::new()),
			synth_bytes: b"audio-bytes".to_vec(),
			moderation: ModerationResult::safe(),
			fail_transcribe: false,
			last_chat_messages: Mutex::new(Vec::new()),
		}
	}

	/// The `messages` argument passed to the most recent `chat_stream` call,
	/// for assertions on how callers build the chat request (e.g. system
	/// prompt selection, `prefer_short_answer` hints).
	#[must_use]
	pub fn last_chat_messages(&self) -> Vec<ChatMessage> {
		self.last_chat_messages.lock().unwrap().clone()
	}

	#[must_use]
	pub fn with_transcribe(mut self, text: impl Into<String>) -> Self {
		self.transcribe_result = text.into();
		self
	}

	#[must_use]
	pub fn with_chat_tokens(self, tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
		*self.chat_tokens.lock().unwrap() = tokens.into_iter().map(Into::into).collect();
		self
	}

	#[must_use]
	pub fn with_moderation(mut self, moderation: ModerationResult) -> Self {
		self.moderation = moderation;
		self
	}
}

impl Default for FakeProvider {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl ProviderAdapter for FakeProvider {
	async fn transcribe(&self, _model: &str, _audio_bytes: &[u8]) -> Result<String, ProviderError> {
		if self.fail_transcribe {
			return Ok(String::new());
		}
		Ok(self.transcribe_result.clone())
	}

	async fn chat(&self, _model: &str, _messages: &[ChatMessage], _max_tokens: u32, _temperature: f32) -> Result<String, ProviderError> {
		Ok(self.chat_tokens.lock().unwrap().concat())
	}

	async fn chat_stream(&self, _model: &str, messages: &[ChatMessage], _max_tokens: u32, _temperature: f32) -> Result<TokenStream, ProviderError> {
		*self.last_chat_messages.lock().unwrap() = messages.to_vec();
		let tokens = self.chat_tokens.lock().unwrap().clone();
		Ok(Box::pin(futures::stream::iter(tokens.into_iter().map(Ok))))
	}

	async fn synthesize(&self, _model: &str, _voice: &str, _text: &str) -> Result<Vec<u8>, ProviderError> {
		Ok(self.synth_bytes.clone())
	}

	async fn moderate(&self, _text: &str) -> Result<ModerationResult, ProviderError> {
		Ok(self.moderation.clone())
	}
}
