//! The `{status, message, data?, code?}` envelope error type (spec §6, and
//! `SPEC_FULL.md` §10.2: every crate's error enum converges on this single
//! `IntoResponse` impl at the admin HTTP boundary).

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use some_services::SettingsError;
use voice_provider::ProviderError;
use voice_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("request path not found")]
	NotFound,

	#[error("{0}")]
	BadRequest(String),

	#[error("settings store error: {0}")]
	Settings(#[from] SettingsError),

	#[error("persistence error: {0}")]
	Store(#[from] StoreError),

	#[error("provider error: {0}")]
	Provider(#[from] ProviderError),
}

impl Error {
	const fn status_code(&self) -> StatusCode {
		match self {
			Self::NotFound => StatusCode::NOT_FOUND,
			Self::BadRequest(_) => StatusCode::BAD_REQUEST,
			Self::Settings(_) | Self::Store(_) | Self::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	const fn code(&self) -> &'static str {
		match self {
			Self::NotFound => "not_found",
			Self::BadRequest(_) => "bad_request",
			Self::Settings(_) => "settings_error",
			Self::Store(_) => "store_error",
			Self::Provider(_) => "provider_error",
		}
	}
}

#[derive(Serialize)]
struct ErrorEnvelope {
	status: &'static str,
	message: String,
	code: &'static str,
}

impl IntoResponse for Error {
	fn into_response(self) -> Response<Body> {
		tracing::warn!(error = %self, code = self.code(), "admin request failed");
		let status = self.status_code();
		let body = ErrorEnvelope {
			status: "error",
			message: self.to_string(),
			code: self.code(),
		};
		(status, Json(body)).into_response()
	}
}
