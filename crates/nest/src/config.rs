//! Admin surface configuration (spec §6: `CORS_ORIGINS`). The rest of the
//! process-wide configuration (provider credentials, models, `PORT`) lives
//! in `voice_gateway::config::Config`, which is the thing that actually
//! parses environment variables; this type is built from its
//! `cors_origins` field rather than re-parsing the environment itself.

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// `CORS_ORIGINS` (spec §6, default `*`): either a literal `*` or a
/// comma-separated allowlist.
#[derive(Debug, Clone)]
pub struct AdminConfig {
	origins: Vec<String>,
}

impl AdminConfig {
	#[must_use]
	pub fn new(cors_origins: &str) -> Self {
		Self {
			origins: cors_origins.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect(),
		}
	}

	#[must_use]
	pub fn cors_layer(&self) -> CorsLayer {
		if self.origins.iter().any(|o| o == "*") {
			return CorsLayer::permissive();
		}

		let origins: Vec<_> = self.origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()).collect();
		CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(tower_http::cors::Any).allow_headers(tower_http::cors::Any)
	}
}

impl Default for AdminConfig {
	fn default() -> Self {
		Self::new("*")
	}
}
