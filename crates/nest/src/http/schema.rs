//! Request/response DTOs for the admin REST surface (spec §6), and the
//! `{status, message, data?, code?}` success envelope all handlers return.

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use voice_store::{ConversationEntry, LogEntry};

#[derive(Serialize)]
pub struct Envelope<T: Serialize> {
	pub status: &'static str,
	pub message: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
	pub fn ok(data: T) -> (StatusCode, Json<Self>) {
		(
			StatusCode::OK,
			Json(Self {
				status: "ok",
				message: "ok",
				data: Some(data),
			}),
		)
	}
}

/// Wraps a bare `Envelope::ok` into an `IntoResponse`-friendly result.
pub fn ok<T: Serialize>(data: T) -> impl IntoResponse {
	Envelope::ok(data)
}

#[derive(Deserialize)]
pub struct LimitQuery {
	pub limit: Option<i64>,
}

pub const DEFAULT_LIST_LIMIT: i64 = 50;

impl LimitQuery {
	#[must_use]
	pub fn limit_or_default(&self) -> i64 {
		self.limit.unwrap_or(DEFAULT_LIST_LIMIT).max(1)
	}
}

#[derive(Deserialize)]
pub struct ApiKeyQuery {
	pub api_key: Option<String>,
}

/// Flat string-value body accepted by `POST /api/admin/settings` (spec
/// §6: "POST body is a flat object of string values").
pub type SettingsBody = HashMap<String, String>;

#[derive(Serialize)]
pub struct StatusResponse {
	pub provider_configured: bool,
	pub provider_valid: bool,
	pub uptime_secs: u64,
}

#[derive(Serialize)]
pub struct TestApiKeyResponse {
	pub valid: bool,
}

#[derive(Serialize)]
pub struct DeletedResponse {
	pub deleted: u64,
}

#[derive(Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub ws: &'static str,
}

#[derive(Serialize)]
pub struct ConversationsResponse {
	pub entries: Vec<ConversationEntry>,
}

#[derive(Serialize)]
pub struct LogsResponse {
	pub entries: Vec<LogEntry>,
}
