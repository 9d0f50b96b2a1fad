use chrono::{DateTime, Utc};
use sqlx::{Error, Row, SqlitePool};

use super::model::{ConversationEntry, LogEntry, NewConversationEntry, NewLogEntry, Role};

fn row_to_conversation(row: &sqlx::sqlite::SqliteRow) -> ConversationEntry {
	let role: String = row.get("role");
	ConversationEntry {
		id: row.get("id"),
		role: Role::parse(&role).unwrap_or(Role::User),
		text: row.get("text"),
		tokens_in: row.get("tokens_in"),
		tokens_out: row.get("tokens_out"),
		cost: row.get("cost"),
		created_at: row.get("created_at"),
	}
}

fn row_to_log(row: &sqlx::sqlite::SqliteRow) -> LogEntry {
	LogEntry {
		id: row.get("id"),
		level: row.get("level"),
		message: row.get("message"),
		created_at: row.get("created_at"),
	}
}

pub async fn read_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>, Error> {
	let row = sqlx::query("SELECT value FROM settings WHERE key = ?").bind(key).fetch_optional(pool).await?;
	Ok(row.map(|r| r.get("value")))
}

pub async fn read_all_settings(pool: &SqlitePool) -> Result<Vec<(String, String)>, Error> {
	let rows = sqlx::query("SELECT key, value FROM settings").fetch_all(pool).await?;
	Ok(rows.into_iter().map(|r| (r.get("key"), r.get("value"))).collect())
}

pub async fn upsert_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<(), Error> {
	sqlx::query("INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value")
		.bind(key)
		.bind(value)
		.execute(pool)
		.await?;
	Ok(())
}

pub async fn insert_conversation_entry(pool: &SqlitePool, entry: NewConversationEntry) -> Result<i64, Error> {
	let id = sqlx::query(
		r"
        INSERT INTO conversations (role, text, tokens_in, tokens_out, cost)
        VALUES (?, ?, ?, ?, ?)
        ",
	)
	.bind(entry.role.as_str())
	.bind(entry.text)
	.bind(entry.tokens_in)
	.bind(entry.tokens_out)
	.bind(entry.cost)
	.execute(pool)
	.await?
	.last_insert_rowid();

	Ok(id)
}

pub async fn fetch_recent_conversations(pool: &SqlitePool, limit: i64) -> Result<Vec<ConversationEntry>, Error> {
	let rows = sqlx::query("SELECT id, role, text, tokens_in, tokens_out, cost, created_at FROM conversations ORDER BY created_at DESC LIMIT ?")
		.bind(limit)
		.fetch_all(pool)
		.await?;

	Ok(rows.iter().map(row_to_conversation).collect())
}

pub async fn clear_conversations(pool: &SqlitePool) -> Result<u64, Error> {
	let result = sqlx::query("DELETE FROM conversations").execute(pool).await?;
	Ok(result.rows_affected())
}

pub async fn insert_log_entry(pool: &SqlitePool, entry: NewLogEntry) -> Result<i64, Error> {
	let id = sqlx::query("INSERT INTO logs (level, message) VALUES (?, ?)")
		.bind(entry.level)
		.bind(entry.message)
		.execute(pool)
		.await?
		.last_insert_rowid();

	Ok(id)
}

pub async fn fetch_recent_logs(pool: &SqlitePool, limit: i64) -> Result<Vec<LogEntry>, Error> {
	let rows = sqlx::query("SELECT id, level, message, created_at FROM logs ORDER BY created_at DESC LIMIT ?")
		.bind(limit)
		.fetch_all(pool)
		.await?;

	Ok(rows.iter().map(row_to_log).collect())
}

pub async fn last_activity(pool: &SqlitePool) -> Result<Option<DateTime<Utc>>, Error> {
	let row = sqlx::query("SELECT created_at FROM conversations ORDER BY created_at DESC LIMIT 1").fetch_optional(pool).await?;
	Ok(row.map(|r| r.get("created_at")))
}
