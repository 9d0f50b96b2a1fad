//! Connection Hub (spec C7, §4.7): accepts the WebSocket upgrade, admits
//! the connection through [`ws_conn_manager::ConnectionGuard`], registers
//! it in a [`ws_connection::ConnectionStore`], and drives one
//! `session_fsm::Session` for its lifetime. Inbound events are dispatched
//! serially (spec §5); the heartbeat task, the partial STT worker, and
//! any in-flight utterance's orchestrator run concurrently alongside it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::{SinkExt, StreamExt};
use session_fsm::{InboundEvent, OutboundEvent, Session, SessionId};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use voice_stt::RollingSttPipelineConfig;
use ws_conn_manager::AcquireErrorKind;
use ws_connection::{ClientId, Connection as LowLevelConnection};
use ws_events::stream_orch::OrchestratorConfig;

use crate::state::AppState;

/// Heartbeat cadence while a session is alive (spec §4.7, §5).
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
/// Bound on the outbound frame queue feeding the single writer task
/// (spec §5: "outbound writes ... MUST be serialized").
const OUTBOUND_BUFFER: usize = 256;

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>, ConnectInfo(addr): ConnectInfo<SocketAddr>) -> impl IntoResponse {
	let client_id = addr.ip().to_string();
	info!(%client_id, "incoming websocket upgrade request");

	if !state.connection_guard.try_acquire_permit_hint() {
		warn!(%client_id, "global connection limit exceeded, rejecting early");
		return (StatusCode::SERVICE_UNAVAILABLE, "too many connections").into_response();
	}

	match timeout(Duration::from_secs(5), state.connection_guard.acquire(client_id.clone())).await {
		Ok(Ok(permit)) => ws.on_upgrade(move |socket| async move {
			handle_socket(socket, state, addr, client_id).await;
			permit.release();
		}),
		Ok(Err(err)) => {
			let reason = match err.kind {
				AcquireErrorKind::QueueFull => "too many pending connections for this client",
				AcquireErrorKind::GlobalLimit => "server is at capacity",
			};
			warn!(%client_id, reason, "rejecting websocket upgrade");
			(StatusCode::SERVICE_UNAVAILABLE, reason).into_response()
		}
		Err(_elapsed) => {
			warn!(%client_id, "timed out waiting for a connection permit");
			(StatusCode::REQUEST_TIMEOUT, "connection acquisition timed out").into_response()
		}
	}
}

async fn handle_socket(socket: WebSocket, state: AppState, addr: SocketAddr, client_id: String) {
	let (mut sink, mut stream) = socket.split();
	let (outbound_tx, mut outbound_rx) = mpsc::channel::<OutboundEvent>(OUTBOUND_BUFFER);

	let registry_key = SessionId::new().to_string();
	let low_level = LowLevelConnection::<String>::new(ClientId::new(client_id.clone()), addr);
	let conn_handle = state.connections.insert(registry_key.clone(), low_level);

	let emit_tx = outbound_tx.clone();
	let emit = Arc::new(move |event: OutboundEvent| {
		let _ = emit_tx.try_send(event);
	});

	let session = Arc::new(Session::new(SessionId::new(), some_services::TokenBucket::default(), emit));

	// Single writer task: every outbound frame, from any task, converges
	// here and is serialized onto the socket (spec §5).
	let writer = tokio::spawn(async move {
		while let Some(event) = outbound_rx.recv().await {
			let Ok(text) = serde_json::to_string(&event) else { continue };
			if sink.send(Message::Text(text)).await.is_err() {
				break;
			}
		}
	});

	let stt = if state.config.openai_api_key.is_empty() {
		None
	} else {
		Some((Arc::clone(&state.provider), state.config.stt_model.clone(), RollingSttPipelineConfig::default()))
	};

	if session.start(stt).await.is_err() {
		writer.abort();
		let _ = conn_handle.disconnect("session start failed".to_string()).await;
		state.connections.remove(&registry_key).await;
		return;
	}

	let heartbeat_session = Arc::clone(&session);
	let heartbeat = tokio::spawn(async move {
		loop {
			tokio::time::sleep(HEARTBEAT_INTERVAL).await;
			if !heartbeat_session.is_alive().await {
				break;
			}
			heartbeat_session.emit_heartbeat().await;
		}
	});

	inbound_loop(&mut stream, &session, &state).await;

	session.close().await;
	heartbeat.abort();
	writer.abort();
	let _ = conn_handle.disconnect("client disconnected".to_string()).await;
	state.connections.remove(&registry_key).await;
	debug!(%registry_key, "connection torn down");
}

async fn inbound_loop(stream: &mut futures::stream::SplitStream<WebSocket>, session: &Arc<Session>, state: &AppState) {
	while let Some(message) = stream.next().await {
		let Ok(message) = message else { break };

		let text = match message {
			Message::Text(text) => text,
			Message::Close(_) => break,
			Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => continue,
		};

		let event: InboundEvent = match serde_json::from_str(&text) {
			Ok(event) => event,
			Err(e) => {
				warn!(error = %e, "failed to parse inbound frame");
				session.emit(OutboundEvent::Error {
					stage: "general".to_string(),
					message: "malformed message".to_string(),
				});
				continue;
			}
		};

		dispatch_inbound(event, session, state).await;
	}
}

async fn dispatch_inbound(event: InboundEvent, session: &Arc<Session>, state: &AppState) {
	match event {
		InboundEvent::Ping => session.on_ping(),
		InboundEvent::GetMetrics => session.on_get_metrics().await,

		InboundEvent::AudioChunk { data } => match BASE64.decode(data) {
			Ok(bytes) => {
				session.on_audio_chunk(bytes).await;
			}
			Err(_) => session.emit(OutboundEvent::Error {
				stage: "audio".to_string(),
				message: "invalid audio chunk".to_string(),
			}),
		},

		InboundEvent::AudioEnd { prefer_short_answer } => match session.on_audio_end(prefer_short_answer).await {
			Ok(trigger) => spawn_utterance(session, trigger, state).await,
			Err(e) => session.emit(OutboundEvent::Error {
				stage: "busy".to_string(),
				message: e.to_string(),
			}),
		},

		InboundEvent::UserText { text } => match session.on_user_text(text).await {
			Ok(trigger) => spawn_utterance(session, trigger, state).await,
			Err(e) => session.emit(OutboundEvent::Error {
				stage: "busy".to_string(),
				message: e.to_string(),
			}),
		},

		InboundEvent::StopTts { reason } => session.on_stop_tts(reason).await,
	}
}

async fn spawn_utterance(session: &Arc<Session>, trigger: session_fsm::UtteranceTrigger, state: &AppState) {
	let cancel = CancellationToken::new();
	session.set_current_utterance(cancel.clone()).await;

	let settings = state.admin.settings.get().await.unwrap_or_default();
	let config = OrchestratorConfig {
		stt_model: state.config.stt_model.clone(),
		..OrchestratorConfig::from_settings(&settings)
	};

	let session = Arc::clone(session);
	let provider = Arc::clone(&state.provider);
	let conversations = Arc::clone(&state.conversations);

	tokio::spawn(async move {
		ws_events::stream_orch::run(session, trigger, provider, config, Some(conversations), cancel).await;
	});
}
