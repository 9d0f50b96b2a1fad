use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use some_services::settings::{SettingsError, SettingsSnapshot, SettingsStore};
use sqlx::SqlitePool;
use thiserror::Error;

use super::model::{ConversationEntry, LogEntry, NewConversationEntry, NewLogEntry};
use super::{queries, schema};

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("voice store error: {0}")]
	Db(#[from] sqlx::Error),
}

impl From<StoreError> for SettingsError {
	fn from(err: StoreError) -> Self {
		Self::Backend(err.to_string())
	}
}

/// Append-only log of user/assistant turns, per spec §6.
#[async_trait]
pub trait ConversationLog: Send + Sync {
	async fn append(&self, entry: NewConversationEntry) -> Result<i64, StoreError>;
	async fn recent(&self, limit: i64) -> Result<Vec<ConversationEntry>, StoreError>;
	async fn clear(&self) -> Result<u64, StoreError>;
	async fn last_activity(&self) -> Result<Option<DateTime<Utc>>, StoreError>;
}

/// Append-only operational log surfaced by the admin REST API, per spec §6.
#[async_trait]
pub trait EventLog: Send + Sync {
	async fn append(&self, entry: NewLogEntry) -> Result<i64, StoreError>;
	async fn recent(&self, limit: i64) -> Result<Vec<LogEntry>, StoreError>;
}

/// SQLite-backed implementation of settings, conversation, and event
/// persistence, all sharing one pool and one set of tables (spec §6).
pub struct SqliteVoiceStore {
	pool: SqlitePool,
}

impl SqliteVoiceStore {
	#[must_use]
	pub const fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub async fn init_schema(&self) -> Result<(), StoreError> {
		schema::init_schema(&self.pool).await
	}
}

#[async_trait]
impl SettingsStore for SqliteVoiceStore {
	async fn read_all(&self) -> Result<SettingsSnapshot, SettingsError> {
		let rows = queries::read_all_settings(&self.pool).await.map_err(StoreError::from)?;
		Ok(rows.into_iter().collect::<HashMap<_, _>>())
	}

	async fn write(&self, key: &str, value: &str) -> Result<(), SettingsError> {
		queries::upsert_setting(&self.pool, key, value).await.map_err(StoreError::from)?;
		Ok(())
	}
}

#[async_trait]
impl ConversationLog for SqliteVoiceStore {
	async fn append(&self, entry: NewConversationEntry) -> Result<i64, StoreError> {
		Ok(queries::insert_conversation_entry(&self.pool, entry).await?)
	}

	async fn recent(&self, limit: i64) -> Result<Vec<ConversationEntry>, StoreError> {
		Ok(queries::fetch_recent_conversations(&self.pool, limit).await?)
	}

	async fn clear(&self) -> Result<u64, StoreError> {
		Ok(queries::clear_conversations(&self.pool).await?)
	}

	async fn last_activity(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
		Ok(queries::last_activity(&self.pool).await?)
	}
}

#[async_trait]
impl EventLog for SqliteVoiceStore {
	async fn append(&self, entry: NewLogEntry) -> Result<i64, StoreError> {
		Ok(queries::insert_log_entry(&self.pool, entry).await?)
	}

	async fn recent(&self, limit: i64) -> Result<Vec<LogEntry>, StoreError> {
		Ok(queries::fetch_recent_logs(&self.pool, limit).await?)
	}
}
