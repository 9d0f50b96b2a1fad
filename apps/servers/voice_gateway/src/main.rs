mod config;
mod observability;
mod state;
mod websocket;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{BoxError, Router};
use nest::AdminConfig;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use voice_provider::{HttpProvider, ProviderAdapter, ProviderConfig};
use voice_store::SqliteVoiceStore;

use crate::config::Config;
use crate::state::AppState;

/// Admin REST requests that stall past this are shed, mirroring the
/// timeout/error layer this repo's other server binaries carry.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

async fn handle_tower_error(error: BoxError) -> (StatusCode, String) {
	if error.is::<tower::timeout::error::Elapsed>() {
		tracing::warn!("request timeout: {error}");
		(StatusCode::REQUEST_TIMEOUT, "request timed out".to_string())
	} else {
		tracing::error!("unhandled tower error: {error}");
		(StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	dotenv::dotenv().ok();
	let config = Config::new();
	let _tracing_guard = observability::init(&config);

	let pool = SqlitePoolOptions::new().connect(&config.database_url).await?;
	let store = Arc::new(SqliteVoiceStore::new(pool));
	store.init_schema().await?;

	let provider: Arc<dyn ProviderAdapter> = Arc::new(HttpProvider::new(ProviderConfig::new(config.openai_base_url.clone(), config.openai_api_key.clone()))?);

	let app_state = AppState::new(config.clone(), store, provider);
	let shutdown_token = app_state.shutdown.clone();

	let admin_config = AdminConfig::new(&app_state.config.cors_origins);
	let admin_router = nest::admin_router(app_state.admin.clone(), &admin_config);

	let ws_router = Router::new().route("/socket.io/", get(websocket::websocket_handler)).with_state(app_state.clone());

	let app = admin_router.merge(ws_router).layer(
		ServiceBuilder::new()
			.layer(HandleErrorLayer::new(handle_tower_error))
			.layer(TraceLayer::new_for_http())
			.timeout(REQUEST_TIMEOUT),
	);

	let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
	let listener = TcpListener::bind(addr).await?;
	tracing::info!(%addr, "voice_gateway listening");

	let signal_token = shutdown_token.clone();
	tokio::spawn(async move {
		tokio::signal::ctrl_c().await.ok();
		tracing::info!("received ctrl-c, initiating shutdown");
		signal_token.cancel();
	});

	let server_token = shutdown_token.clone();
	axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
		.with_graceful_shutdown(async move { server_token.cancelled().await })
		.await?;

	tracing::info!("server stopped, draining connections");
	app_state.connections.shutdown_all().await;
	tracing::info!("shutdown complete");
	Ok(())
}
