use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use some_services::rate_limiter::{rate_limit_middleware, TokenBucketRateLimiter};

use crate::config::AdminConfig;
use crate::http::handlers::{conversations, health, logs, restart, settings, status, test_api_key};
use crate::http::state::AdminState;

/// Admin surface requests are shed past this rate: the admin REST API
/// (spec §6) is an operator/dashboard surface, not the high-throughput
/// voice path, so a generous per-process budget is enough to blunt a
/// runaway poller without needing per-client keys.
const ADMIN_RATE_LIMIT_PER_MINUTE: u32 = 120;

/// Builds the admin REST router (spec §6). The caller (`voice_gateway`)
/// merges this into the same `Router`/listener as the WebSocket upgrade
/// route, since both surfaces share one `PORT`.
#[must_use]
pub fn admin_router(state: AdminState, config: &AdminConfig) -> Router {
	let limiter = Arc::new(TokenBucketRateLimiter::new(ADMIN_RATE_LIMIT_PER_MINUTE));

	Router::new()
		.route("/api/admin/status", get(status::status))
		.route("/api/admin/settings", get(settings::get_settings).post(settings::post_settings))
		.route("/api/admin/test-api-key", post(test_api_key::test_api_key))
		.route("/api/admin/conversations", get(conversations::list).delete(conversations::clear))
		.route("/api/admin/logs", get(logs::list))
		.route("/api/admin/restart", post(restart::restart))
		.layer(from_fn_with_state(limiter, rate_limit_middleware))
		.route("/health", get(health::health))
		.route("/api/health", get(health::health))
		.layer(config.cors_layer())
		.with_state(state)
}
