use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	System,
	User,
	Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
	pub role: Role,
	pub content: String,
}

impl ChatMessage {
	#[must_use]
	pub fn system(content: impl Into<String>) -> Self {
		Self { role: Role::System, content: content.into() }
	}

	#[must_use]
	pub fn user(content: impl Into<String>) -> Self {
		Self { role: Role::User, content: content.into() }
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModerationResult {
	pub flagged: bool,
	pub categories: Vec<String>,
}

impl ModerationResult {
	#[must_use]
	pub fn safe() -> Self {
		Self::default()
	}
}

/// A finite, non-restartable, producer-paced sequence of chat token
/// fragments in arrival order (spec §4.4 `chat_stream`).
pub type TokenStream = BoxStream<'static, Result<String, ProviderError>>;
