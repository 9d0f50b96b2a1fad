//! Settings Cache (spec C1, §4.1).
//!
//! First `get()` after construction or invalidation reads through to the
//! store under a lock; subsequent `get()` calls return a clone of the
//! cached snapshot until the next write or explicit invalidation. The lock
//! is only ever held across the synchronous snapshot swap, never across
//! the store I/O itself, beyond what a single `await` naturally spans.

use super::store::{SettingsError, SettingsSnapshot, SettingsStore};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct SettingsCache {
	store: Arc<dyn SettingsStore>,
	cached: Mutex<Option<SettingsSnapshot>>,
}

impl SettingsCache {
	#[must_use]
	pub fn new(store: Arc<dyn SettingsStore>) -> Self {
		Self {
			store,
			cached: Mutex::new(None),
		}
	}

	/// Returns a snapshot, populating the cache from the store on first
	/// call or after invalidation.
	pub async fn get(&self) -> Result<SettingsSnapshot, SettingsError> {
		let mut cached = self.cached.lock().await;
		if let Some(snapshot) = cached.as_ref() {
			return Ok(snapshot.clone());
		}
		let fresh = self.store.read_all().await?;
		*cached = Some(fresh.clone());
		Ok(fresh)
	}

	/// Writes through to the store, then updates the cached snapshot.
	/// On store failure the cache is invalidated so the next `get()`
	/// re-reads rather than serving a snapshot that predates the failed
	/// write's intent.
	pub async fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
		if let Err(e) = self.store.write(key, value).await {
			self.cached.lock().await.take();
			return Err(e);
		}

		let mut cached = self.cached.lock().await;
		match cached.as_mut() {
			Some(snapshot) => {
				snapshot.insert(key.to_string(), value.to_string());
			}
			None => {
				// Nothing cached yet; next get() will read through, which
				// already reflects this write since it already landed.
			}
		}
		Ok(())
	}

	/// Forces the next `get()` to read through to the store.
	pub async fn invalidate(&self) {
		self.cached.lock().await.take();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use std::collections::HashMap;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use tokio::sync::Mutex as TokioMutex;

	struct FakeStore {
		data: TokioMutex<HashMap<String, String>>,
		reads: AtomicUsize,
		fail_next_write: std::sync::atomic::AtomicBool,
	}

	impl FakeStore {
		fn new() -> Self {
			Self {
				data: TokioMutex::new(HashMap::new()),
				reads: AtomicUsize::new(0),
				fail_next_write: std::sync::atomic::AtomicBool::new(false),
			}
		}
	}

	#[async_trait]
	impl SettingsStore for FakeStore {
		async fn read_all(&self) -> Result<SettingsSnapshot, SettingsError> {
			self.reads.fetch_add(1, Ordering::SeqCst);
			Ok(self.data.lock().await.clone())
		}

		async fn write(&self, key: &str, value: &str) -> Result<(), SettingsError> {
			if self.fail_next_write.swap(false, Ordering::SeqCst) {
				return Err(SettingsError::Backend("injected failure".into()));
			}
			self.data.lock().await.insert(key.to_string(), value.to_string());
			Ok(())
		}
	}

	#[tokio::test]
	async fn caches_after_first_read() {
		let store = Arc::new(FakeStore::new());
		let cache = SettingsCache::new(store.clone());

		cache.get().await.unwrap();
		cache.get().await.unwrap();
		cache.get().await.unwrap();

		assert_eq!(store.reads.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn set_updates_cache_without_a_re_read() {
		let store = Arc::new(FakeStore::new());
		let cache = SettingsCache::new(store.clone());

		cache.get().await.unwrap();
		cache.set("tier", "medium").await.unwrap();
		let snap = cache.get().await.unwrap();

		assert_eq!(snap.get("tier"), Some(&"medium".to_string()));
		assert_eq!(store.reads.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn failed_write_invalidates_cache() {
		let store = Arc::new(FakeStore::new());
		let cache = SettingsCache::new(store.clone());
		cache.get().await.unwrap();

		store.fail_next_write.store(true, Ordering::SeqCst);
		assert!(cache.set("tier", "high").await.is_err());

		cache.get().await.unwrap();
		assert_eq!(store.reads.load(Ordering::SeqCst), 2, "invalidated cache must re-read on next get");
	}

	#[tokio::test]
	async fn idempotent_write_yields_same_snapshot() {
		let store = Arc::new(FakeStore::new());
		let cache = SettingsCache::new(store.clone());

		cache.set("voice_name", "alloy").await.unwrap();
		let first = cache.get().await.unwrap();
		cache.set("voice_name", "alloy").await.unwrap();
		let second = cache.get().await.unwrap();

		assert_eq!(first, second);
	}
}
