use axum::Json;

use crate::http::schema::HealthResponse;

/// `GET /health` and `GET /api/health` (spec §6). The `ws` field names the
/// original Socket.IO mount path for client backward-compatibility, even
/// though this gateway upgrades the core pipeline on a plain WebSocket
/// route rather than over Socket.IO.
pub async fn health() -> Json<HealthResponse> {
	Json(HealthResponse { status: "ok", ws: "/socket.io/" })
}
