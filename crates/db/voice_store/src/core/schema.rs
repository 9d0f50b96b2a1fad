use sqlx::SqlitePool;

use super::repository::StoreError;

/// Creates the three tables and two indexes named in spec §6. Uses
/// runtime-checked `sqlx::query` rather than the `query!` macro so the
/// crate builds without a live database at compile time.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
	sqlx::query(
		r"
		CREATE TABLE IF NOT EXISTS settings (
			key TEXT PRIMARY KEY,
			value TEXT NOT NULL
		)
		",
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r"
		CREATE TABLE IF NOT EXISTS conversations (
			id INTEGER PRIMARY KEY AUTOINCREMENT,
			role TEXT NOT NULL,
			text TEXT NOT NULL,
			tokens_in INTEGER NOT NULL DEFAULT 0,
			tokens_out INTEGER NOT NULL DEFAULT 0,
			cost REAL NOT NULL DEFAULT 0.0,
			created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
		)
		",
	)
	.execute(pool)
	.await?;

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_conversations_created_at ON conversations(created_at DESC)")
		.execute(pool)
		.await?;

	sqlx::query(
		r"
		CREATE TABLE IF NOT EXISTS logs (
			id INTEGER PRIMARY KEY AUTOINCREMENT,
			level TEXT NOT NULL,
			message TEXT NOT NULL,
			created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
		)
		",
	)
	.execute(pool)
	.await?;

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_level_created_at ON logs(level, created_at)")
		.execute(pool)
		.await?;

	Ok(())
}
