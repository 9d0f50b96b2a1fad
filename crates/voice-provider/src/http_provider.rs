use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart;
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::types::{ChatMessage, ModerationResult, Role, TokenStream};
use crate::{ProviderAdapter, DEFAULT_TIMEOUT_SECS};

#[derive(Debug, Clone)]
pub struct ProviderConfig {
	pub base_url: String,
	pub api_key: String,
	pub timeout: Duration,
}

impl ProviderConfig {
	#[must_use]
	pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			api_key: api_key.into(),
			timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
		}
	}
}

/// OpenAI-compatible HTTP implementation of [`ProviderAdapter`].
pub struct HttpProvider {
	client: reqwest::Client,
	config: ProviderConfig,
}

impl HttpProvider {
	/// # Errors
	/// Returns an error if the underlying `reqwest::Client` fails to build.
	pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
		let client = reqwest::Client::builder().timeout(config.timeout).build()?;
		Ok(Self { client, config })
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
	}

	fn role_str(role: Role) -> &'static str {
		match role {
			Role::System => "system",
			Role::User => "user",
			Role::Assistant => "assistant",
		}
	}

	fn messages_json(messages: &[ChatMessage]) -> Value {
		Value::Array(
			messages
				.iter()
				.map(|m| json!({ "role": Self::role_str(m.role), "content": m.content }))
				.collect(),
		)
	}
}

#[async_trait]
impl ProviderAdapter for HttpProvider {
	async fn transcribe(&self, model: &str, audio_bytes: &[u8]) -> Result<String, ProviderError> {
		let part = multipart::Part::bytes(audio_bytes.to_vec()).file_name("audio.webm");
		let form = multipart::Form::new().part("file", part).text("model", model.to_string());

		let resp = self
			.client
			.post(self.url("/audio/transcriptions"))
			.bearer_auth(&self.config.api_key)
			.multipart(form)
			.send()
			.await?;

		if !resp.status().is_success() {
			tracing::warn!(status = %resp.status(), "transcribe: non-2xx from provider");
			return Ok(String::new());
		}

		let body: Value = resp.json().await?;
		Ok(body.get("text").and_then(Value::as_str).unwrap_or_default().to_string())
	}

	async fn chat(&self, model: &str, messages: &[ChatMessage], max_tokens: u32, temperature: f32) -> Result<String, ProviderError> {
		let payload = json!({
			"model": model,
			"messages": Self::messages_json(messages),
			"max_tokens": max_tokens,
			"temperature": temperature,
			"stream": false,
		});

		let resp = self.client.post(self.url("/chat/completions")).bearer_auth(&self.config.api_key).json(&payload).send().await?;

		if !resp.status().is_success() {
			tracing::warn!(status = %resp.status(), "chat: non-2xx from provider");
			return Ok(String::new());
		}

		let body: Value = resp.json().await?;
		let text = body
			.get("choices")
			.and_then(|c| c.get(0))
			.and_then(|c| c.get("message"))
			.and_then(|m| m.get("content"))
			.and_then(Value::as_str)
			.unwrap_or_default()
			.to_string();
		Ok(text)
	}

	async fn chat_stream(&self, model: &str, messages: &[ChatMessage], max_tokens: u32, temperature: f32) -> Result<TokenStream, ProviderError> {
		let payload = json!({
			"model": model,
			"messages": Self::messages_json(messages),
			"max_tokens": max_tokens,
			"temperature": temperature,
			"stream": true,
		});

		let resp = self.client.post(self.url("/chat/completions")).bearer_auth(&self.config.api_key).json(&payload).send().await?;

		if !resp.status().is_success() {
			tracing::warn!(status = %resp.status(), "chat_stream: non-2xx from provider");
			return Ok(Box::pin(futures::stream::empty()));
		}

		let mut byte_stream = resp.bytes_stream();
		let stream = async_stream::stream! {
			let mut buf = String::new();
			while let Some(chunk) = byte_stream.next().await {
				let chunk = match chunk {
					Ok(c) => c,
					Err(e) => {
						yield Err(ProviderError::from(e));
						return;
					}
				};
				buf.push_str(&String::from_utf8_lossy(&chunk));

				while let Some(pos) = buf.find("\n\n") {
					let event = buf[..pos].to_string();
					buf.drain(..pos + 2);

					for line in event.lines() {
						let Some(data) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")) else { continue };
						let data = data.trim();
						if data == "[DONE]" {
							return;
						}
						match serde_json::from_str::<Value>(data) {
							Ok(parsed) => {
								if let Some(token) = parsed
									.get("choices")
									.and_then(|c| c.get(0))
									.and_then(|c| c.get("delta"))
									.and_then(|d| d.get("content"))
									.and_then(Value::as_str)
								{
									if !token.is_empty() {
										yield Ok(token.to_string());
									}
								}
							}
							Err(e) => yield Err(ProviderError::from(e)),
						}
					}
				}
			}
		};

		Ok(Box::pin(stream))
	}

	async fn synthesize(&self, model: &str, voice: &str, text: &str) -> Result<Vec<u8>, ProviderError> {
		let payload = json!({ "model": model, "voice": voice, "input": text });

		let resp = self.client.post(self.url("/audio/speech")).bearer_auth(&self.config.api_key).json(&payload).send().await?;

		if !resp.status().is_success() {
			tracing::warn!(status = %resp.status(), "synthesize: non-2xx from provider");
			return Ok(Vec::new());
		}

		Ok(resp.bytes().await?.to_vec())
	}

	async fn moderate(&self, text: &str) -> Result<ModerationResult, ProviderError> {
		let payload = json!({ "input": text });
		let resp = self.client.post(self.url("/moderations")).bearer_auth(&self.config.api_key).json(&payload).send().await?;

		if !resp.status().is_success() {
			return Ok(ModerationResult::safe());
		}

		let body: Value = resp.json().await?;
		let Some(result) = body.get("results").and_then(|r| r.get(0)) else {
			return Ok(ModerationResult::safe());
		};

		let flagged = result.get("flagged").and_then(Value::as_bool).unwrap_or(false);
		let categories = result
			.get("categories")
			.and_then(Value::as_object)
			.map(|map| map.iter().filter(|(_, v)| v.as_bool().unwrap_or(false)).map(|(k, _)| k.clone()).collect())
			.unwrap_or_default();

		Ok(ModerationResult { flagged, categories })
	}
}
