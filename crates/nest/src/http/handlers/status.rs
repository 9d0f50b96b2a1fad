use axum::extract::State;
use axum::response::IntoResponse;

use crate::http::schema::{ok, StatusResponse};
use crate::http::state::AdminState;
use crate::http::Result;

/// `GET /api/admin/status` (spec §6).
pub async fn status(State(state): State<AdminState>) -> Result<impl IntoResponse> {
	let snapshot = state.settings.get().await?;
	let provider_configured = snapshot.get("openai_api_key").is_some_and(|k| !k.is_empty());

	Ok(ok(StatusResponse {
		provider_configured,
		provider_valid: state.provider_valid(),
		uptime_secs: state.uptime_secs(),
	}))
}
