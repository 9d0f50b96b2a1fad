use axum::extract::{Query, State};
use axum::response::IntoResponse;

use crate::http::schema::{ok, LimitQuery, LogsResponse};
use crate::http::state::AdminState;
use crate::http::Result;

/// `GET /api/admin/logs?limit=N` (spec §6).
pub async fn list(State(state): State<AdminState>, Query(query): Query<LimitQuery>) -> Result<impl IntoResponse> {
	let entries = state.logs.recent(query.limit_or_default()).await?;
	Ok(ok(LogsResponse { entries }))
}
