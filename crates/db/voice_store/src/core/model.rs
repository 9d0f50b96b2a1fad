use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	User,
	Assistant,
}

impl Role {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::User => "user",
			Self::Assistant => "assistant",
		}
	}

	#[must_use]
	pub fn parse(value: &str) -> Option<Self> {
		match value {
			"user" => Some(Self::User),
			"assistant" => Some(Self::Assistant),
			_ => None,
		}
	}
}

/// A row in the append-only `conversations` table (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
	pub id: i64,
	pub role: Role,
	pub text: String,
	pub tokens_in: i64,
	pub tokens_out: i64,
	pub cost: f64,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewConversationEntry {
	pub role: Role,
	pub text: String,
	pub tokens_in: i64,
	pub tokens_out: i64,
	pub cost: f64,
}

impl NewConversationEntry {
	#[must_use]
	pub fn user(text: impl Into<String>, tokens_in: i64) -> Self {
		Self {
			role: Role::User,
			text: text.into(),
			tokens_in,
			tokens_out: 0,
			cost: 0.0,
		}
	}

	#[must_use]
	pub fn assistant(text: impl Into<String>, tokens_in: i64, tokens_out: i64, cost: f64) -> Self {
		Self {
			role: Role::Assistant,
			text: text.into(),
			tokens_in,
			tokens_out,
			cost,
		}
	}
}

/// A row in the append-only `logs` table (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
	pub id: i64,
	pub level: String,
	pub message: String,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLogEntry {
	pub level: String,
	pub message: String,
}
