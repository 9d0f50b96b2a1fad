#![cfg(feature = "stream-orch")]

//! Streaming Orchestrator (spec C6, §4.6): the per-utterance pipeline that
//! fans an LLM token stream out into sentence-granular, parallel TTS
//! dispatch and delivers audio back to the client in either completion or
//! sequence order.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use session_fsm::{now_ts, OutboundEvent, Session, UtteranceTrigger};
use voice_provider::{moderate_fail_open, ChatMessage, ProviderAdapter};
use voice_store::{ConversationLog, NewConversationEntry};

use super::config::{DeliveryOrder, OrchestratorConfig, MIN_SENTENCE_LENGTH};
use super::cost::{chat_cost, estimate_tokens, tts_cost};
use super::error::Stage;
use super::pool::TtsPool;
use super::segmenter::{forced_break_point, sentence_complete};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful, concise voice assistant. Keep replies short and conversational.";
const REFUSAL_TEXT: &str = "I'm sorry, I can't help with that request.";
/// Appended to the user turn when `audio_end{prefer_short_answer: true}` is
/// set and no custom `system_prompt` is configured (spec §4.5 `audio_end`).
const SHORT_ANSWER_HINT: &str = " Please keep your answer brief, one or two sentences.";

/// Runs one utterance end to end (spec §4.6 steps 1-8). Consumes the
/// `CancellationToken` the caller registered as `session.current_utterance`
/// (spec §4.5): cancelling it from anywhere (an inbound `stop_tts`, or a
/// session close) causes this function to stop dispatching new TTS work,
/// discard in-flight results, and return without emitting
/// `result_llm`/`tts_end`/`pipeline_complete` — the `Processing -> Idle`
/// transition on cancellation instead runs through `tts_cancelled`,
/// emitted synchronously by `Session::on_stop_tts`.
#[instrument(skip_all, fields(session_id = %session.id()))]
pub async fn run(session: Arc<Session>, trigger: UtteranceTrigger, provider: Arc<dyn ProviderAdapter>, config: OrchestratorConfig, conversation_log: Option<Arc<dyn ConversationLog>>, cancel: CancellationToken) {
	let prefer_short_answer = matches!(&trigger, UtteranceTrigger::Audio { prefer_short_answer: true, .. });

	let user_text = match resolve_user_text(&session, &provider, &config.stt_model, trigger).await {
		Ok(text) => text,
		Err(()) => {
			session.complete_utterance().await;
			return;
		}
	};

	if config.moderation_enabled {
		let result = moderate_fail_open(provider.as_ref(), &user_text).await;
		if result.flagged {
			run_refusal(&session, &provider, &config).await;
			log_conversation(&conversation_log, NewConversationEntry::user(&user_text, estimate_tokens(&user_text) as i64)).await;
			log_conversation(&conversation_log, NewConversationEntry::assistant(REFUSAL_TEXT, 0, estimate_tokens(REFUSAL_TEXT) as i64, 0.0)).await;
			session.complete_utterance().await;
			return;
		}
	}

	log_conversation(&conversation_log, NewConversationEntry::user(&user_text, estimate_tokens(&user_text) as i64)).await;

	let chat_user_text = if prefer_short_answer && config.system_prompt.is_none() {
		format!("{user_text}{SHORT_ANSWER_HINT}")
	} else {
		user_text.clone()
	};
	let messages = [ChatMessage::system(config.system_prompt.clone().unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())), ChatMessage::user(chat_user_text)];

	let stream_start = Instant::now();
	let mut token_stream = match provider.chat_stream(&config.chat_model, &messages, config.max_tokens_out, config.temperature).await {
		Ok(stream) => stream,
		Err(e) => {
			session.emit(OutboundEvent::Error { stage: Stage::Chat.to_string(), message: e.to_string() });
			session.complete_utterance().await;
			return;
		}
	};

	let mut assistant_text = String::new();
	let mut sentence_buffer = String::new();
	let mut first_token_seen = false;
	let mut sequence_counter: u32 = 0;
	let mut pool = TtsPool::new(config.tts_pool_size);

	'tokens: loop {
		if cancel.is_cancelled() {
			break;
		}

		let fragment = tokio::select! {
			biased;
			() = cancel.cancelled() => break 'tokens,
			next = token_stream.next() => next,
		};

		let Some(fragment) = fragment else { break };

		let fragment = match fragment {
			Ok(f) => f,
			Err(e) => {
				session.emit(OutboundEvent::Error { stage: Stage::Streaming.to_string(), message: e.to_string() });
				break;
			}
		};

		if fragment.is_empty() {
			continue;
		}

		assistant_text.push_str(&fragment);
		sentence_buffer.push_str(&fragment);

		if !first_token_seen {
			first_token_seen = true;
			session.emit(OutboundEvent::LlmFirstToken { token: fragment.clone(), ts: now_ts() });
			let elapsed = stream_start.elapsed().as_millis() as u64;
			session.update_metrics(|m| m.first_token_ms = elapsed).await;
		}

		session.emit(OutboundEvent::LlmToken { token: fragment.clone(), accumulated: assistant_text.clone() });

		if sentence_complete(&sentence_buffer, &fragment) && sentence_buffer.trim().chars().count() >= MIN_SENTENCE_LENGTH {
			dispatch_sentence(&session, &provider, &config, &mut pool, &mut sequence_counter, std::mem::take(&mut sentence_buffer)).await;
			continue;
		}

		if let Some(split_at) = forced_break_point(&sentence_buffer) {
			let remainder = sentence_buffer.split_off(split_at);
			let ready = std::mem::replace(&mut sentence_buffer, remainder.trim_start().to_string());
			dispatch_sentence(&session, &provider, &config, &mut pool, &mut sequence_counter, ready).await;
		}
	}

	if !cancel.is_cancelled() && !sentence_buffer.trim().is_empty() {
		dispatch_sentence(&session, &provider, &config, &mut pool, &mut sequence_counter, sentence_buffer).await;
	}

	let llm_ms = stream_start.elapsed().as_millis() as u64;
	session.update_metrics(|m| m.llm_ms = llm_ms).await;

	let (total_chunks, synthesized_chars) = drain_tts_pool(&session, &config, &mut pool, &cancel).await;

	if cancel.is_cancelled() {
		session.complete_utterance().await;
		return;
	}

	session.emit(OutboundEvent::ResultLlm { text: assistant_text.clone(), from: "assistant" });

	let tokens_in = estimate_tokens(&user_text);
	let tokens_out = estimate_tokens(&assistant_text);
	let cost = chat_cost(config.tier, tokens_in, tokens_out) + tts_cost(synthesized_chars);
	log_conversation(&conversation_log, NewConversationEntry::assistant(&assistant_text, i64::from(tokens_in), i64::from(tokens_out), cost)).await;

	session.emit(OutboundEvent::TtsEnd { total_chunks });
	session.emit(OutboundEvent::PipelineComplete { total_chunks });
	session.complete_utterance().await;
}

/// Step 1 (spec §4.6): for an audio-triggered utterance, transcribes the
/// buffered audio and emits `result_stt`; for a text-triggered one, the
/// text is already final and `result_stt` is never emitted (spec scenario
/// 2: "Expect no result_stt").
async fn resolve_user_text(session: &Session, provider: &Arc<dyn ProviderAdapter>, stt_model: &str, trigger: UtteranceTrigger) -> Result<String, ()> {
	match trigger {
		UtteranceTrigger::Text { text } => Ok(text),
		UtteranceTrigger::Audio { bytes, .. } => {
			let stt_start = Instant::now();
			let text = provider.transcribe(stt_model, &bytes).await.unwrap_or_default();
			let stt_ms = stt_start.elapsed().as_millis() as u64;
			session.update_metrics(|m| m.stt_ms = stt_ms).await;

			if text.trim().is_empty() {
				session.emit(OutboundEvent::Error {
					stage: Stage::Stt.to_string(),
					message: "No speech detected".to_string(),
				});
				return Err(());
			}

			session.emit(OutboundEvent::ResultStt { text: text.clone(), from: "user" });
			Ok(text)
		}
	}
}

/// Step 2 fixed safe-refusal path (spec §4.6): synthesizes and delivers a
/// canned refusal in place of the normal chat/TTS pipeline.
async fn run_refusal(session: &Session, provider: &Arc<dyn ProviderAdapter>, config: &OrchestratorConfig) {
	session.emit(OutboundEvent::ResultLlm { text: REFUSAL_TEXT.to_string(), from: "assistant" });
	let audio = provider.synthesize(&config.tts_model, &config.voice, REFUSAL_TEXT).await.unwrap_or_default();
	session.emit(OutboundEvent::AudioChunk {
		audio: BASE64.encode(&audio),
		sequence_id: 1,
		text: REFUSAL_TEXT.to_string(),
		tts_ms: 0,
		is_final: true,
	});
	session.emit(OutboundEvent::TtsEnd { total_chunks: 1 });
	session.emit(OutboundEvent::PipelineComplete { total_chunks: 1 });
}

/// Step 6/7 (spec §4.6): optional output moderation, then submission to
/// the bounded TTS pool with the next `sequence_id`.
async fn dispatch_sentence(session: &Session, provider: &Arc<dyn ProviderAdapter>, config: &OrchestratorConfig, pool: &mut TtsPool, sequence_counter: &mut u32, text: String) {
	let text = text.trim().to_string();
	if text.is_empty() {
		return;
	}

	let text = if config.moderation_enabled {
		let result = moderate_fail_open(provider.as_ref(), &text).await;
		if result.flagged {
			warn!("output sentence flagged by moderation, substituting safe text");
			"I'd rather not say that.".to_string()
		} else {
			text
		}
	} else {
		text
	};

	*sequence_counter += 1;
	let sequence_id = *sequence_counter;
	pool.dispatch(Arc::clone(provider), config.tts_model.clone(), config.voice.clone(), sequence_id, text);
}

/// After the token stream ends, waits for every outstanding TTS task and
/// delivers each result per `config.delivery` (spec §4.6b). Returns the
/// count of chunks actually emitted and the total characters synthesized
/// (for TTS cost accounting), both excluding cancelled/discarded output.
async fn drain_tts_pool(session: &Session, config: &OrchestratorConfig, pool: &mut TtsPool, cancel: &CancellationToken) -> (u32, usize) {
	let mut total_chunks = 0u32;
	let mut synthesized_chars = 0usize;
	let mut total_tts_ms = 0u64;
	let mut pending: BTreeMap<u32, super::pool::TtsOutcome> = BTreeMap::new();
	let mut next_expected: u32 = 1;

	while let Some(outcome) = pool.join_next().await {
		if cancel.is_cancelled() {
			// Discard: spec §4.6b requires in-flight TTS output be
			// dropped once cancellation is observed, never emitted.
			continue;
		}

		if let Some(error) = outcome.error {
			session.emit(OutboundEvent::TtsChunkError {
				sequence_id: outcome.sequence_id,
				text: outcome.text,
				error,
			});
			continue;
		}

		synthesized_chars += outcome.text.chars().count();
		total_tts_ms += outcome.tts_ms;

		match config.delivery {
			DeliveryOrder::Completion => {
				emit_audio_chunk(session, &outcome.text, outcome.sequence_id, &outcome.audio, outcome.tts_ms);
				total_chunks += 1;
			}
			DeliveryOrder::InOrder => {
				pending.insert(outcome.sequence_id, outcome);
				while let Some(ready) = pending.remove(&next_expected) {
					emit_audio_chunk(session, &ready.text, ready.sequence_id, &ready.audio, ready.tts_ms);
					total_chunks += 1;
					next_expected += 1;
				}
			}
		}
	}

	// Any sequence IDs that never arrived contiguously (should not happen
	// absent a bug, since every dispatched task eventually resolves) are
	// flushed at the end so no result is silently dropped.
	for (_, ready) in pending {
		emit_audio_chunk(session, &ready.text, ready.sequence_id, &ready.audio, ready.tts_ms);
		total_chunks += 1;
	}

	session.update_metrics(|m| m.tts_ms = total_tts_ms).await;
	(total_chunks, synthesized_chars)
}

fn emit_audio_chunk(session: &Session, text: &str, sequence_id: u32, audio: &[u8], tts_ms: u64) {
	session.emit(OutboundEvent::AudioChunk {
		audio: BASE64.encode(audio),
		sequence_id,
		text: text.to_string(),
		tts_ms,
		is_final: false,
	});
}

async fn log_conversation(log: &Option<Arc<dyn ConversationLog>>, entry: NewConversationEntry) {
	if let Some(log) = log {
		if let Err(e) = log.append(entry).await {
			warn!(error = %e, "failed to append conversation entry, proceeding (fail-open persistence)");
		}
	}
}
