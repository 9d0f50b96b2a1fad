use axum::extract::{Query, State};
use axum::response::IntoResponse;

use crate::http::schema::{ok, ApiKeyQuery, TestApiKeyResponse};
use crate::http::state::AdminState;
use crate::http::Result;

/// `POST /api/admin/test-api-key{api_key?}` (spec §6): validates a key by
/// calling the provider's `models` list. Falls back to the currently
/// configured `openai_api_key`/`openai_base_url` settings when the query
/// param is omitted.
pub async fn test_api_key(State(state): State<AdminState>, Query(query): Query<ApiKeyQuery>) -> Result<impl IntoResponse> {
	let snapshot = state.settings.get().await?;
	let api_key = query.api_key.filter(|k| !k.is_empty()).or_else(|| snapshot.get("openai_api_key").cloned()).unwrap_or_default();
	let base_url = snapshot.get("openai_base_url").cloned().unwrap_or_else(|| "https://api.openai.com/v1".to_string());

	let valid = if api_key.is_empty() {
		false
	} else {
		state
			.http_client
			.get(format!("{}/models", base_url.trim_end_matches('/')))
			.bearer_auth(&api_key)
			.send()
			.await
			.is_ok_and(|resp| resp.status().is_success())
	};

	state.set_provider_valid(valid);
	Ok(ok(TestApiKeyResponse { valid }))
}
