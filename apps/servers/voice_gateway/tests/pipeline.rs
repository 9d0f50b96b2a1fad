//! Drives `session_fsm::Session` and `ws_events::stream_orch::run` directly
//! against `voice_provider::testing::FakeProvider`, exercising spec §8's
//! end-to-end scenarios without a real socket or upstream provider.

use std::sync::{Arc, Mutex};

use session_fsm::{OutboundEvent, Session, SessionId, SessionState, UtteranceTrigger};
use some_services::TokenBucket;
use tokio_util::sync::CancellationToken;
use voice_provider::testing::FakeProvider;
use voice_provider::ProviderAdapter;
use ws_events::stream_orch::{run, OrchestratorConfig};

fn recording_session() -> (Arc<Session>, Arc<Mutex<Vec<OutboundEvent>>>) {
	let log: Arc<Mutex<Vec<OutboundEvent>>> = Arc::new(Mutex::new(Vec::new()));
	let log_clone = Arc::clone(&log);
	let emit = Arc::new(move |event: OutboundEvent| log_clone.lock().expect("lock").push(event));
	let session = Arc::new(Session::new(SessionId::new(), TokenBucket::default(), emit));
	(session, log)
}

fn events_of(log: &Arc<Mutex<Vec<OutboundEvent>>>) -> Vec<OutboundEvent> {
	log.lock().expect("lock").clone()
}

/// Text-triggered happy path (spec scenario 1/2): no `result_stt`, a
/// streamed chat completion, one audio chunk per sentence, and a final
/// `pipeline_complete`.
#[tokio::test]
async fn text_utterance_streams_chat_and_audio_then_completes() {
	let (session, log) = recording_session();
	session.start(None).await.expect("start");

	let provider: Arc<dyn ProviderAdapter> = Arc::new(FakeProvider::new().with_chat_tokens(["Hello", " there.", " How are you?"]));
	let config = OrchestratorConfig::default();

	let trigger = session.on_user_text("hi".to_string()).await.expect("on_user_text");
	let cancel = CancellationToken::new();
	session.set_current_utterance(cancel.clone()).await;

	run(Arc::clone(&session), trigger, provider, config, None, cancel).await;

	let events = events_of(&log);
	assert!(!events.iter().any(|e| matches!(e, OutboundEvent::ResultStt { .. })), "text utterances never emit result_stt");
	assert!(events.iter().any(|e| matches!(e, OutboundEvent::ResultLlm { text, .. } if text.contains("Hello"))));
	assert!(events.iter().any(|e| matches!(e, OutboundEvent::AudioChunk { .. })));
	assert!(matches!(events.last(), Some(OutboundEvent::PipelineComplete { .. })));
	assert_eq!(session.state().await, SessionState::Idle, "session returns to idle once the utterance completes");
}

/// Audio-triggered utterance emits `result_stt` before the chat/TTS steps
/// (spec §4.6 step 1).
#[tokio::test]
async fn audio_utterance_emits_result_stt_first() {
	let (session, log) = recording_session();
	session.start(None).await.expect("start");

	let provider: Arc<dyn ProviderAdapter> = Arc::new(FakeProvider::new().with_transcribe("what's the weather").with_chat_tokens(["It's sunny."]));
	let config = OrchestratorConfig::default();

	session.on_audio_chunk(vec![0u8; 16]).await;
	let trigger = session.on_audio_end(false).await.expect("on_audio_end");
	let cancel = CancellationToken::new();
	session.set_current_utterance(cancel.clone()).await;

	run(Arc::clone(&session), trigger, provider, config, None, cancel).await;

	let events = events_of(&log);
	let stt_pos = events.iter().position(|e| matches!(e, OutboundEvent::ResultStt { text, .. } if text == "what's the weather"));
	let llm_pos = events.iter().position(|e| matches!(e, OutboundEvent::ResultLlm { .. }));
	assert!(stt_pos.is_some() && llm_pos.is_some() && stt_pos < llm_pos, "result_stt must precede result_llm");
}

/// Empty transcription (spec §4.6 edge case) surfaces a `stt` stage error
/// and leaves the utterance completed without reaching the chat step.
#[tokio::test]
async fn empty_transcription_emits_stt_error_and_completes() {
	let (session, log) = recording_session();
	session.start(None).await.expect("start");

	let provider: Arc<dyn ProviderAdapter> = Arc::new(FakeProvider::new().with_transcribe(""));
	let config = OrchestratorConfig::default();

	let trigger = session.on_audio_end(false).await.expect("on_audio_end");
	let cancel = CancellationToken::new();
	session.set_current_utterance(cancel.clone()).await;

	run(Arc::clone(&session), trigger, provider, config, None, cancel).await;

	let events = events_of(&log);
	assert!(events.iter().any(|e| matches!(e, OutboundEvent::Error { stage, .. } if stage == "stt")));
	assert!(!events.iter().any(|e| matches!(e, OutboundEvent::ResultLlm { .. })));
	assert_eq!(session.state().await, SessionState::Idle);
}

/// Barge-in (spec §4.6b, scenario 5): cancelling the utterance's token
/// stops audio delivery and the pipeline never reaches `pipeline_complete`.
#[tokio::test]
async fn stop_tts_cancels_before_pipeline_completes() {
	let (session, log) = recording_session();
	session.start(None).await.expect("start");

	let provider: Arc<dyn ProviderAdapter> = Arc::new(FakeProvider::new().with_chat_tokens(["Long reply that would normally stream on."]));
	let config = OrchestratorConfig::default();

	let trigger = session.on_user_text("tell me a story".to_string()).await.expect("on_user_text");
	let cancel = CancellationToken::new();
	session.set_current_utterance(cancel.clone()).await;

	cancel.cancel();
	run(Arc::clone(&session), trigger, provider, config, None, cancel).await;

	let events = events_of(&log);
	assert!(!events.iter().any(|e| matches!(e, OutboundEvent::PipelineComplete { .. })), "a cancelled utterance must not reach pipeline_complete");
	assert_eq!(session.state().await, SessionState::Processing, "run() leaves the Processing->Idle transition to on_stop_tts on cancellation");

	session.on_stop_tts(Some("user requested".to_string())).await;
	assert_eq!(session.state().await, SessionState::Idle);
	assert!(events_of(&log).iter().any(|e| matches!(e, OutboundEvent::TtsCancelled { .. })));
}

/// A second utterance while one is already in flight is rejected (spec
/// §4.5 `busy`), independent of the orchestrator itself.
#[tokio::test]
async fn busy_session_rejects_a_second_utterance() {
	let (session, _log) = recording_session();
	session.start(None).await.expect("start");

	session.on_user_text("first".to_string()).await.expect("first utterance admitted");
	let second = session.on_user_text("second".to_string()).await;
	assert!(second.is_err(), "a session already processing an utterance must reject a second one");
}

/// Rate-limited audio chunks are denied by the token bucket before ever
/// reaching the orchestrator (spec §4.3/§4.6 admission).
#[tokio::test]
async fn exhausted_token_bucket_denies_audio_chunks() {
	let log: Arc<Mutex<Vec<OutboundEvent>>> = Arc::new(Mutex::new(Vec::new()));
	let log_clone = Arc::clone(&log);
	let emit = Arc::new(move |event: OutboundEvent| log_clone.lock().expect("lock").push(event));
	let session = Session::new(SessionId::new(), TokenBucket::new(0.0, 0.0), emit);
	session.start(None).await.expect("start");

	let outcome = session.on_audio_chunk(vec![1, 2, 3]).await;
	assert_eq!(outcome, session_fsm::AdmitOutcome::Denied);
	assert!(events_of(&log).iter().any(|e| matches!(e, OutboundEvent::Error { stage, .. } if stage == "rate_limit")));
}

/// A `synthesize` implementation that takes a small, measurable amount of
/// wall-clock time, so tests can assert `metrics.tts_ms` actually reflects
/// TTS work rather than trivially reading back a zeroed default.
struct SlowSynthesisProvider {
	inner: FakeProvider,
}

#[async_trait::async_trait]
impl ProviderAdapter for SlowSynthesisProvider {
	async fn transcribe(&self, model: &str, audio_bytes: &[u8]) -> Result<String, voice_provider::ProviderError> {
		self.inner.transcribe(model, audio_bytes).await
	}

	async fn chat(&self, model: &str, messages: &[voice_provider::ChatMessage], max_tokens: u32, temperature: f32) -> Result<String, voice_provider::ProviderError> {
		self.inner.chat(model, messages, max_tokens, temperature).await
	}

	async fn chat_stream(
		&self,
		model: &str,
		messages: &[voice_provider::ChatMessage],
		max_tokens: u32,
		temperature: f32,
	) -> Result<voice_provider::TokenStream, voice_provider::ProviderError> {
		self.inner.chat_stream(model, messages, max_tokens, temperature).await
	}

	async fn synthesize(&self, model: &str, voice: &str, text: &str) -> Result<Vec<u8>, voice_provider::ProviderError> {
		tokio::time::sleep(std::time::Duration::from_millis(5)).await;
		self.inner.synthesize(model, voice, text).await
	}

	async fn moderate(&self, text: &str) -> Result<voice_provider::ModerationResult, voice_provider::ProviderError> {
		self.inner.moderate(text).await
	}
}

/// Spec §4.6c / `SPEC_FULL.md` §10: the session's `tts_ms` gauge must
/// reflect the utterance's TTS work, not stay stuck at its zeroed default.
#[tokio::test]
async fn pipeline_completion_populates_the_tts_ms_gauge() {
	let (session, log) = recording_session();
	session.start(None).await.expect("start");

	let provider: Arc<dyn ProviderAdapter> = Arc::new(SlowSynthesisProvider {
		inner: FakeProvider::new().with_chat_tokens(["A reasonably long sentence to synthesize."]),
	});
	let config = OrchestratorConfig::default();

	let trigger = session.on_user_text("hi".to_string()).await.expect("on_user_text");
	let cancel = CancellationToken::new();
	session.set_current_utterance(cancel.clone()).await;

	run(Arc::clone(&session), trigger, provider, config, None, cancel).await;
	assert!(matches!(events_of(&log).last(), Some(OutboundEvent::PipelineComplete { .. })));

	session.on_get_metrics().await;
	let metrics = events_of(&log)
		.into_iter()
		.rev()
		.find_map(|e| match e {
			OutboundEvent::Metrics(m) => Some(m),
			_ => None,
		})
		.expect("a metrics snapshot was emitted");
	assert!(metrics.tts_ms > 0, "tts_ms must reflect the time spent synthesizing, got {}", metrics.tts_ms);
}

/// Spec §4.5 `audio_end{prefer_short_answer}`: when no custom system prompt
/// is configured, the flag must actually change the chat request rather
/// than being plumbed through and dropped.
#[tokio::test]
async fn prefer_short_answer_hints_the_chat_request_when_no_system_prompt_is_set() {
	let (session, _log) = recording_session();
	session.start(None).await.expect("start");

	let provider = Arc::new(FakeProvider::new().with_transcribe("what's the weather").with_chat_tokens(["It's sunny."]));
	let provider_dyn: Arc<dyn ProviderAdapter> = provider.clone();
	let mut config = OrchestratorConfig::default();
	config.system_prompt = None;

	session.on_audio_chunk(vec![0u8; 16]).await;
	let trigger = session.on_audio_end(true).await.expect("on_audio_end");
	let cancel = CancellationToken::new();
	session.set_current_utterance(cancel.clone()).await;

	run(Arc::clone(&session), trigger, provider_dyn, config, None, cancel).await;

	let messages = provider.last_chat_messages();
	let user_message = messages.iter().find(|m| m.role == voice_provider::Role::User).expect("a user message was sent");
	assert_ne!(user_message.content, "what's the weather", "prefer_short_answer must change the outgoing chat request");
	assert!(user_message.content.starts_with("what's the weather"), "the original transcript must still be present");
}
