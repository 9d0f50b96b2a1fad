use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;

use crate::http::schema::ok;
use crate::http::state::AdminState;
use crate::http::Result;

/// `POST /api/admin/restart` (spec §6): "re-read credentials from
/// environment". There is no process restart; this invalidates the
/// settings cache so the next read goes through to the store, and drops
/// the last known `test-api-key` result since it may no longer hold.
pub async fn restart(State(state): State<AdminState>) -> Result<impl IntoResponse> {
	state.settings.invalidate().await;
	state.set_provider_valid(false);
	Ok(ok(json!({ "restarted": true })))
}
