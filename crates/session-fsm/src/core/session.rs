use std::sync::Arc;

use some_services::TokenBucket;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use voice_provider::ProviderAdapter;
use voice_stt::{RollingSttPipeline, RollingSttPipelineConfig};

use super::state::{SessionState, SessionTransition, StateHandle};
use crate::events::{now_ts, OutboundEvent};
use crate::types::{AdmitOutcome, SessionError, SessionId, SessionMetrics, UtteranceTrigger};

/// Caps `inbound_buffer` at the same depth as the original `audio_buffers`
/// ring (roughly 40s of audio at 160 buffers, 250ms/chunk).
const INBOUND_BUFFER_CAP: usize = 160;

pub type Emit = Arc<dyn Fn(OutboundEvent) + Send + Sync>;

/// Per-connection state orchestrating one utterance at a time (spec §4.5).
pub struct Session {
	id: SessionId,
	admitter: TokenBucket,
	inbound_buffer: Mutex<Vec<Vec<u8>>>,
	partial_pipeline: Mutex<Option<RollingSttPipeline>>,
	metrics: Mutex<SessionMetrics>,
	state: StateHandle,
	current_utterance: Mutex<Option<CancellationToken>>,
	emit: Emit,
}

impl Session {
	#[must_use]
	pub fn new(id: SessionId, admitter: TokenBucket, emit: Emit) -> Self {
		Self {
			id,
			admitter,
			inbound_buffer: Mutex::new(Vec::new()),
			partial_pipeline: Mutex::new(None),
			metrics: Mutex::new(SessionMetrics::default()),
			state: StateHandle::new(),
			current_utterance: Mutex::new(None),
			emit,
		}
	}

	#[must_use]
	pub const fn id(&self) -> SessionId {
		self.id
	}

	/// Accepts the connection: emits `hello`, moves to `Idle`, and starts
	/// the rolling partial-transcription worker if STT credentials were
	/// configured for this session.
	pub async fn start(&self, stt: Option<(Arc<dyn ProviderAdapter>, String, RollingSttPipelineConfig)>) -> Result<(), SessionError> {
		self.state.transition(SessionTransition::Start).await?;

		if let Some((provider, model, config)) = stt {
			let emit = Arc::clone(&self.emit);
			let pipeline = RollingSttPipeline::start(
				provider,
				model,
				config,
				Box::new(move |partial| {
					emit(OutboundEvent::PartialTranscription { text: partial.text });
				}),
			);
			*self.partial_pipeline.lock().await = Some(pipeline);
		}

		(self.emit)(OutboundEvent::Hello { ts: now_ts() });
		Ok(())
	}

	pub fn on_ping(&self) {
		(self.emit)(OutboundEvent::Pong { ts: now_ts() });
	}

	/// Pushes one outbound frame. Exposed so the streaming orchestrator
	/// (spec C6), which runs as a task alongside the session rather than
	/// inside it, can emit on this session's behalf without reaching past
	/// its own module boundary into the writer.
	pub fn emit(&self, event: OutboundEvent) {
		(self.emit)(event);
	}

	pub async fn on_get_metrics(&self) {
		let snapshot = self.metrics.lock().await.clone();
		(self.emit)(OutboundEvent::Metrics(snapshot));
	}

	/// Admits an audio chunk through the token bucket (C2), buffers it, and
	/// feeds it to the partial pipeline if one is running.
	pub async fn on_audio_chunk(&self, chunk: Vec<u8>) -> AdmitOutcome {
		if !self.admitter.allow() {
			(self.emit)(OutboundEvent::Error {
				stage: "rate_limit".to_string(),
				message: "audio chunk rejected, rate limit exceeded".to_string(),
			});
			return AdmitOutcome::Denied;
		}

		let _ = self.state.transition(SessionTransition::BeginListening).await;

		{
			let mut buffer = self.inbound_buffer.lock().await;
			buffer.push(chunk.clone());
			if buffer.len() > INBOUND_BUFFER_CAP {
				buffer.remove(0);
			}
		}

		{
			let mut metrics = self.metrics.lock().await;
			metrics.bytes_received += chunk.len() as u64;
			metrics.chunks_received += 1;
			metrics.last_activity_ts = Some(chrono::Utc::now());
		}

		if let Some(pipeline) = self.partial_pipeline.lock().await.as_ref() {
			pipeline.push_chunk(chunk, true).await;
			if let Some(error) = pipeline.take_last_error().await {
				self.metrics.lock().await.last_error = Some(error);
			}
		}

		AdmitOutcome::Admitted
	}

	/// Finalizes the buffered audio into a trigger for the streaming
	/// orchestrator (C6), draining `inbound_buffer`.
	pub async fn on_audio_end(&self, prefer_short_answer: bool) -> Result<UtteranceTrigger, SessionError> {
		self.begin_utterance().await?;
		let bytes = self.inbound_buffer.lock().await.drain(..).flatten().collect();
		Ok(UtteranceTrigger::Audio { bytes, prefer_short_answer })
	}

	/// A synchronous single-turn utterance supplied as text (no STT step).
	pub async fn on_user_text(&self, text: String) -> Result<UtteranceTrigger, SessionError> {
		self.begin_utterance().await?;
		Ok(UtteranceTrigger::Text { text })
	}

	async fn begin_utterance(&self) -> Result<(), SessionError> {
		self.state.transition(SessionTransition::BeginProcessing).await.map_err(|_| {
			tracing::warn!(session_id = %self.id, "rejected utterance, one is already in flight");
			SessionError::Busy
		})?;
		let mut metrics = self.metrics.lock().await;
		metrics.utterances_total += 1;
		Ok(())
	}

	/// Registers the cancellation token for the utterance now in flight so
	/// `stop_tts` can reach it.
	pub async fn set_current_utterance(&self, token: CancellationToken) {
		*self.current_utterance.lock().await = Some(token);
	}

	pub async fn on_stop_tts(&self, reason: Option<String>) {
		if let Some(token) = self.current_utterance.lock().await.take() {
			token.cancel();
			self.metrics.lock().await.interruptions += 1;
			tracing::debug!(session_id = %self.id, "cancelled current utterance");
		}
		(self.emit)(OutboundEvent::TtsCancelled {
			ts: now_ts(),
			reason: reason.unwrap_or_else(|| "client_request".to_string()),
		});
		let _ = self.state.transition(SessionTransition::Complete).await;
	}

	/// Called by the streaming orchestrator once `pipeline_complete` or
	/// `error` ends the utterance, returning the session to `Idle`.
	pub async fn complete_utterance(&self) {
		self.current_utterance.lock().await.take();
		let _ = self.state.transition(SessionTransition::Complete).await;
	}

	/// Lets the streaming orchestrator update counters (`stt_ms`,
	/// `first_token_ms`, `llm_ms`, `tts_ms`, `last_error`) without exposing
	/// the lock itself.
	pub async fn update_metrics(&self, f: impl FnOnce(&mut SessionMetrics)) {
		let mut metrics = self.metrics.lock().await;
		f(&mut metrics);
		metrics.last_activity_ts = Some(chrono::Utc::now());
	}

	pub async fn state(&self) -> SessionState {
		self.state.current().await
	}

	pub async fn is_alive(&self) -> bool {
		!matches!(self.state.current().await, SessionState::Closed)
	}

	pub async fn emit_heartbeat(&self) {
		(self.emit)(OutboundEvent::ServerHeartbeat { ts: now_ts() });
	}

	/// Tears the session down: cancels any in-flight utterance, stops the
	/// partial pipeline, and releases buffers.
	pub async fn close(&self) {
		tracing::debug!(session_id = %self.id, "closing session");
		let _ = self.state.transition(SessionTransition::Close).await;
		if let Some(token) = self.current_utterance.lock().await.take() {
			token.cancel();
		}
		if let Some(pipeline) = self.partial_pipeline.lock().await.take() {
			pipeline.stop();
		}
		self.inbound_buffer.lock().await.clear();
	}
}
