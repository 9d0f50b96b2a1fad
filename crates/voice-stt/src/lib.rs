//! Rolling STT Pipeline (spec C3, §4.3): a background worker that emits
//! best-effort `partial_transcription` previews over a bounded window of
//! recent "speaking" audio, without blocking the session's event loop.
//!
//! Ordering guarantee (spec §4.3): partial emissions are monotonic in real
//! time; they carry no ordering relationship to the utterance's final,
//! authoritative transcription, which is always re-emitted separately.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use voice_provider::ProviderAdapter;

/// Default bounded window of recent speaking chunks fed to `transcribe`
/// (~1.5s at 4 chunks/sec).
pub const DEFAULT_WINDOW_CHUNKS: usize = 6;
/// Default pre-roll ring retained while not speaking.
pub const DEFAULT_PREROLL_CHUNKS: usize = 5;
/// Minimum spacing between partial emissions.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);
/// Worker wakeup cadence.
const WORKER_TICK: Duration = Duration::from_millis(50);

pub type EmitFn = Box<dyn Fn(PartialTranscript) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct PartialTranscript {
	pub text: String,
	pub partial: bool,
}

struct Inner {
	preroll: Vec<Vec<u8>>,
	window: Vec<Vec<u8>>,
	drained_preroll: bool,
	last_emit_ts: Option<Instant>,
	last_error: Option<String>,
}

impl Inner {
	fn new() -> Self {
		Self {
			preroll: Vec::new(),
			window: Vec::new(),
			drained_preroll: false,
			last_emit_ts: None,
			last_error: None,
		}
	}

	fn reset(&mut self) {
		self.preroll.clear();
		self.window.clear();
		self.drained_preroll = false;
		self.last_emit_ts = None;
	}
}

pub struct RollingSttPipelineConfig {
	pub window_chunks: usize,
	pub preroll_chunks: usize,
	pub min_interval: Duration,
}

impl Default for RollingSttPipelineConfig {
	fn default() -> Self {
		Self {
			window_chunks: DEFAULT_WINDOW_CHUNKS,
			preroll_chunks: DEFAULT_PREROLL_CHUNKS,
			min_interval: DEFAULT_MIN_INTERVAL,
		}
	}
}

/// A per-session background worker that never crashes the session: all
/// provider errors are swallowed and recorded, not propagated.
pub struct RollingSttPipeline {
	inner: Arc<AsyncMutex<Inner>>,
	cancel: CancellationToken,
	handle: AsyncMutex<Option<JoinHandle<()>>>,
	config: RollingSttPipelineConfig,
}

impl RollingSttPipeline {
	pub fn start(provider: Arc<dyn ProviderAdapter>, stt_model: String, config: RollingSttPipelineConfig, emit: EmitFn) -> Self {
		let inner = Arc::new(AsyncMutex::new(Inner::new()));
		let cancel = CancellationToken::new();

		let worker_inner = inner.clone();
		let worker_cancel = cancel.clone();
		let min_interval = config.min_interval;
		let window_chunks = config.window_chunks;
		let worker_model = stt_model.clone();

		let handle = tokio::spawn(async move {
			let mut ticker = tokio::time::interval(WORKER_TICK);
			loop {
				tokio::select! {
					() = worker_cancel.cancelled() => break,
					_ = ticker.tick() => {}
				}

				let snapshot = {
					let mut guard = worker_inner.lock().await;
					let now = Instant::now();
					if let Some(last) = guard.last_emit_ts {
						if now.duration_since(last) < min_interval {
							continue;
						}
					}
					let start = guard.window.len().saturating_sub(window_chunks);
					let concatenated: Vec<u8> = guard.window[start..].iter().flatten().copied().collect();
					guard.last_emit_ts = Some(now);
					concatenated
				};

				if snapshot.is_empty() {
					continue;
				}

				match provider.transcribe(&worker_model, &snapshot).await {
					Ok(text) if !text.trim().is_empty() => {
						emit(PartialTranscript { text, partial: true });
					}
					Ok(_) => {}
					Err(e) => {
						worker_inner.lock().await.last_error = Some(e.to_string());
					}
				}
			}
		});

		Self {
			inner,
			cancel,
			handle: AsyncMutex::new(Some(handle)),
			config,
		}
	}

	/// Feed one audio chunk. While `speaking` is true, the pre-roll buffer
	/// is drained into the rolling window exactly once, then every
	/// subsequent chunk is appended directly to the window. While not
	/// speaking, chunks only accumulate in the pre-roll ring.
	pub async fn push_chunk(&self, chunk: Vec<u8>, speaking: bool) {
		let mut guard = self.inner.lock().await;
		if speaking {
			if !guard.drained_preroll {
				let preroll = std::mem::take(&mut guard.preroll);
				guard.window.extend(preroll);
				guard.drained_preroll = true;
			}
			guard.window.push(chunk);
			let window_chunks = self.config.window_chunks;
			if guard.window.len() > window_chunks * 4 {
				let excess = guard.window.len() - window_chunks * 4;
				guard.window.drain(..excess);
			}
		} else {
			guard.preroll.push(chunk);
			let preroll_chunks = self.config.preroll_chunks;
			if guard.preroll.len() > preroll_chunks {
				let excess = guard.preroll.len() - preroll_chunks;
				guard.preroll.drain(..excess);
			}
		}
	}

	/// Clears both buffers and resets the emission clock. Called at the
	/// start of a new utterance (spec §4.6 step 1 resets the pipeline
	/// after buffered audio is handed off to STT).
	pub async fn reset(&self) {
		self.inner.lock().await.reset();
	}

	/// Signals the worker to stop at its next wakeup. Does not block; call
	/// `join().await` to wait for actual termination.
	pub fn stop(&self) {
		self.cancel.cancel();
	}

	pub async fn join(&self) {
		if let Some(handle) = self.handle.lock().await.take() {
			let _ = handle.await;
		}
	}

	/// Takes and clears the last provider error recorded by the worker, if
	/// any, for surfacing into session metrics.
	pub async fn take_last_error(&self) -> Option<String> {
		self.inner.lock().await.last_error.take()
	}
}

impl Drop for RollingSttPipeline {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex as StdMutex;
	use voice_provider::testing::FakeProvider;

	#[tokio::test]
	async fn preroll_drains_into_window_on_first_speaking_chunk() {
		let provider = Arc::new(FakeProvider::new().with_transcribe("hola"));
		let emitted = Arc::new(StdMutex::new(Vec::new()));
		let emitted_clone = emitted.clone();

		let pipeline = RollingSttPipeline::start(
			provider,
			"whisper-1".into(),
			RollingSttPipelineConfig {
				min_interval: Duration::from_millis(10),
				..Default::default()
			},
			Box::new(move |p| emitted_clone.lock().unwrap().push(p.text)),
		);

		pipeline.push_chunk(vec![1], false).await;
		pipeline.push_chunk(vec![2], false).await;
		pipeline.push_chunk(vec![3], true).await;

		{
			let guard = pipeline.inner.lock().await;
			assert_eq!(guard.window.len(), 3);
			assert!(guard.drained_preroll);
			assert!(guard.preroll.is_empty());
		}

		pipeline.stop();
		pipeline.join().await;
	}

	#[tokio::test]
	async fn worker_emits_partial_text_without_crashing_on_error() {
		let provider = Arc::new(FakeProvider::new().with_transcribe(""));
		let calls = Arc::new(AtomicUsize::new(0));
		let calls_clone = calls.clone();

		let pipeline = RollingSttPipeline::start(
			provider,
			"whisper-1".into(),
			RollingSttPipelineConfig {
				min_interval: Duration::from_millis(10),
				..Default::default()
			},
			Box::new(move |_| {
				calls_clone.fetch_add(1, Ordering::SeqCst);
			}),
		);

		pipeline.push_chunk(vec![1, 2, 3], true).await;
		tokio::time::sleep(Duration::from_millis(150)).await;

		// empty transcript result must not emit.
		assert_eq!(calls.load(Ordering::SeqCst), 0);

		pipeline.stop();
		pipeline.join().await;
	}

	#[tokio::test]
	async fn reset_clears_buffers_and_emission_clock() {
		let provider = Arc::new(FakeProvider::new());
		let pipeline = RollingSttPipeline::start(provider, "whisper-1".into(), RollingSttPipelineConfig::default(), Box::new(|_| {}));

		pipeline.push_chunk(vec![1], true).await;
		pipeline.reset().await;

		let guard = pipeline.inner.lock().await;
		assert!(guard.window.is_empty());
		assert!(guard.preroll.is_empty());
		assert!(!guard.drained_preroll);
		assert!(guard.last_emit_ts.is_none());
		drop(guard);

		pipeline.stop();
		pipeline.join().await;
	}

	struct FailingProvider;

	#[async_trait::async_trait]
	impl voice_provider::ProviderAdapter for FailingProvider {
		async fn transcribe(&self, _model: &str, _audio_bytes: &[u8]) -> Result<String, voice_provider::ProviderError> {
			Err(voice_provider::ProviderError::Timeout)
		}

		async fn chat(&self, _model: &str, _messages: &[voice_provider::ChatMessage], _max_tokens: u32, _temperature: f32) -> Result<String, voice_provider::ProviderError> {
			unreachable!("not exercised by this pipeline")
		}

		async fn chat_stream(
			&self,
			_model: &str,
			_messages: &[voice_provider::ChatMessage],
			_max_tokens: u32,
			_temperature: f32,
		) -> Result<voice_provider::TokenStream, voice_provider::ProviderError> {
			unreachable!("not exercised by this pipeline")
		}

		async fn synthesize(&self, _model: &str, _voice: &str, _text: &str) -> Result<Vec<u8>, voice_provider::ProviderError> {
			unreachable!("not exercised by this pipeline")
		}

		async fn moderate(&self, _text: &str) -> Result<voice_provider::ModerationResult, voice_provider::ProviderError> {
			unreachable!("not exercised by this pipeline")
		}
	}

	#[tokio::test]
	async fn a_transcribe_error_is_recorded_and_swallowed() {
		let pipeline = RollingSttPipeline::start(
			Arc::new(FailingProvider),
			"whisper-1".into(),
			RollingSttPipelineConfig {
				min_interval: Duration::from_millis(10),
				..Default::default()
			},
			Box::new(|_| {}),
		);

		pipeline.push_chunk(vec![1, 2, 3], true).await;
		tokio::time::sleep(Duration::from_millis(150)).await;

		let error = pipeline.take_last_error().await;
		assert!(error.is_some(), "a provider error must be recorded rather than crash the worker");
		assert!(pipeline.take_last_error().await.is_none(), "take_last_error clears the recorded error");

		pipeline.stop();
		pipeline.join().await;
	}
}
