#![cfg(feature = "stream-orch")]

//! Bounded TTS worker pool (spec §4.6b). Submission from the token loop is
//! non-blocking: dispatching a sentence spawns a task immediately and
//! returns, while a [`tokio::sync::Semaphore`] caps how many `synthesize`
//! calls actually run concurrently (default 4, per
//! [`super::config::DEFAULT_TTS_POOL_SIZE`]).

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use voice_provider::ProviderAdapter;

/// One completed (or failed) TTS dispatch, carrying its `sequence_id` so
/// the caller can deliver in completion order or reorder by sequence
/// (spec §4.6b).
pub struct TtsOutcome {
	pub sequence_id: u32,
	pub text: String,
	pub audio: Vec<u8>,
	pub tts_ms: u64,
	pub error: Option<String>,
}

/// Owns the semaphore gating concurrent `synthesize` calls and the
/// [`JoinSet`] tracking outstanding tasks. One instance per utterance.
pub struct TtsPool {
	semaphore: Arc<Semaphore>,
	tasks: JoinSet<TtsOutcome>,
}

impl TtsPool {
	#[must_use]
	pub fn new(size: usize) -> Self {
		Self {
			semaphore: Arc::new(Semaphore::new(size.max(1))),
			tasks: JoinSet::new(),
		}
	}

	/// Spawns a synthesis task for `sequence_id`/`text` immediately. The
	/// task itself waits on the semaphore before calling `synthesize`, so
	/// dispatch never blocks the token loop even when the pool is full.
	pub fn dispatch(&mut self, provider: Arc<dyn ProviderAdapter>, model: String, voice: String, sequence_id: u32, text: String) {
		let semaphore = Arc::clone(&self.semaphore);
		self.tasks.spawn(async move {
			let _permit = semaphore.acquire().await.expect("tts pool semaphore never closes");
			let start = Instant::now();
			match provider.synthesize(&model, &voice, &text).await {
				Ok(audio) => TtsOutcome {
					sequence_id,
					text,
					audio,
					tts_ms: start.elapsed().as_millis() as u64,
					error: None,
				},
				Err(e) => TtsOutcome {
					sequence_id,
					text,
					audio: Vec::new(),
					tts_ms: start.elapsed().as_millis() as u64,
					error: Some(e.to_string()),
				},
			}
		});
	}

	/// Waits for the next outstanding task to finish, in completion order.
	/// Returns `None` once every dispatched task has resolved.
	pub async fn join_next(&mut self) -> Option<TtsOutcome> {
		loop {
			match self.tasks.join_next().await {
				Some(Ok(outcome)) => return Some(outcome),
				// A synthesis task only ever returns normally; a join
				// error here means the task panicked, which we treat as
				// an unrecoverable synthesis failure rather than crash
				// the utterance.
				Some(Err(_)) => continue,
				None => return None,
			}
		}
	}

	pub fn has_outstanding(&self) -> bool {
		!self.tasks.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use voice_provider::testing::FakeProvider;

	#[tokio::test]
	async fn dispatched_tasks_all_resolve() {
		let provider: Arc<dyn ProviderAdapter> = Arc::new(FakeProvider::new());
		let mut pool = TtsPool::new(2);

		for i in 1..=5u32 {
			pool.dispatch(Arc::clone(&provider), "tts-1".into(), "alloy".into(), i, format!("sentence {i}"));
		}

		let mut seen = Vec::new();
		while let Some(outcome) = pool.join_next().await {
			assert!(outcome.error.is_none());
			seen.push(outcome.sequence_id);
		}
		seen.sort_unstable();
		assert_eq!(seen, vec![1, 2, 3, 4, 5]);
	}

	#[tokio::test]
	async fn pool_of_one_still_serializes_without_dropping_work() {
		let provider: Arc<dyn ProviderAdapter> = Arc::new(FakeProvider::new());
		let mut pool = TtsPool::new(1);
		pool.dispatch(Arc::clone(&provider), "tts-1".into(), "alloy".into(), 1, "a".into());
		pool.dispatch(Arc::clone(&provider), "tts-1".into(), "alloy".into(), 2, "b".into());

		let first = pool.join_next().await.expect("first outcome");
		let second = pool.join_next().await.expect("second outcome");
		assert_ne!(first.sequence_id, second.sequence_id);
	}
}
