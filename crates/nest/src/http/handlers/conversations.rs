use axum::extract::{Query, State};
use axum::response::IntoResponse;

use crate::http::schema::{ok, ConversationsResponse, DeletedResponse, LimitQuery};
use crate::http::state::AdminState;
use crate::http::Result;

/// `GET /api/admin/conversations?limit=N` (spec §6).
pub async fn list(State(state): State<AdminState>, Query(query): Query<LimitQuery>) -> Result<impl IntoResponse> {
	let entries = state.conversations.recent(query.limit_or_default()).await?;
	Ok(ok(ConversationsResponse { entries }))
}

/// `DELETE /api/admin/conversations` (spec §6).
pub async fn clear(State(state): State<AdminState>) -> Result<impl IntoResponse> {
	let deleted = state.conversations.clear().await?;
	Ok(ok(DeletedResponse { deleted }))
}
