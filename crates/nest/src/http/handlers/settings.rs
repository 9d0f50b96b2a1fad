use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::http::schema::{ok, SettingsBody};
use crate::http::state::AdminState;
use crate::http::Result;

const SECRET_KEYS: &[&str] = &["openai_api_key"];

/// `GET /api/admin/settings` (spec §6). Secret-shaped values are masked in
/// the response; the underlying store is untouched.
pub async fn get_settings(State(state): State<AdminState>) -> Result<impl IntoResponse> {
	let snapshot = state.settings.get().await?;
	Ok(ok(mask_secrets(snapshot)))
}

/// `POST /api/admin/settings` (spec §6): body is a flat object of string
/// values; writes are last-write-wins and invalidate the process-wide
/// cached snapshot (spec §3, `some_services::SettingsCache`).
pub async fn post_settings(State(state): State<AdminState>, Json(body): Json<SettingsBody>) -> Result<impl IntoResponse> {
	for (key, value) in &body {
		state.settings.set(key, value).await?;
	}
	let snapshot = state.settings.get().await?;
	Ok(ok(mask_secrets(snapshot)))
}

fn mask_secrets(mut snapshot: SettingsBody) -> SettingsBody {
	for key in SECRET_KEYS {
		if let Some(value) = snapshot.get_mut(*key) {
			if !value.is_empty() {
				*value = mask(value);
			}
		}
	}
	snapshot
}

fn mask(value: &str) -> String {
	let tail: String = value.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
	format!("****{tail}")
}
