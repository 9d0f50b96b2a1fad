use crate::actor::ConnectionHandle;
use crate::core::conn::Connection;
use crate::core::subscription::EventKey;
use crate::types::ConnectionState;
use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-connection command channel depth (spec §5: suspension points on
/// provider/WebSocket I/O never block this channel; 100 gives headroom for
/// bursts of subscribe/heartbeat commands).
const COMMAND_BUFFER: usize = 100;

/// Registry of accepted connections, keyed by an opaque string id (e.g. a
/// session id's `to_string()`). One actor runs per entry; dropping a key
/// here does not itself stop the actor — callers should `remove` to shut
/// it down cleanly, or rely on `shutdown_all` at process teardown.
#[derive(Debug, Clone)]
pub struct ConnectionStore<K: EventKey = String> {
	handles: Arc<DashMap<String, ConnectionHandle<K>>>,
	shutdown: CancellationToken,
}

impl<K: EventKey> ConnectionStore<K> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			handles: Arc::new(DashMap::new()),
			shutdown: CancellationToken::new(),
		}
	}

	/// Insert connection handle and spawn its actor, bound to this store's
	/// shutdown token so `shutdown_all` tears every actor down at once.
	pub fn insert(&self, key: String, connection: Connection<K>) -> ConnectionHandle<K> {
		let (handle, actor, _child_token) = ConnectionHandle::new(connection, COMMAND_BUFFER, &self.shutdown);
		tokio::spawn(actor.run());
		self.handles.insert(key, handle.clone());
		handle
	}

	/// Get connection handle
	pub fn get(&self, key: &str) -> Option<ConnectionHandle<K>> {
		self.handles.get(key).map(|entry| entry.value().clone())
	}

	/// Remove connection and shutdown its actor
	pub async fn remove(&self, key: &str) -> Option<ConnectionHandle<K>> {
		if let Some((_, handle)) = self.handles.remove(key) {
			let _ = handle.shutdown().await;
			Some(handle)
		} else {
			None
		}
	}

	pub fn len(&self) -> usize {
		self.handles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handles.is_empty()
	}

	pub fn keys(&self) -> Vec<String> {
		self.handles.iter().map(|entry| entry.key().clone()).collect()
	}

	/// Get stats by querying all actors
	pub async fn stats(&self) -> ConnectionStoreStats {
		let mut active = 0;
		let mut stale = 0;
		let mut disconnected = 0;
		let mut unique_clients = std::collections::HashSet::new();

		for entry in self.handles.iter() {
			let handle = entry.value();
			unique_clients.insert(handle.connection.client_id.clone());

			if let Ok(state) = handle.get_state().await {
				match state {
					ConnectionState::Active { .. } => active += 1,
					ConnectionState::Stale { .. } => stale += 1,
					ConnectionState::Disconnected { .. } => disconnected += 1,
				}
			}
		}

		ConnectionStoreStats {
			total_connections: self.handles.len(),
			active_connections: active,
			stale_connections: stale,
			disconnected_connections: disconnected,
			unique_clients: unique_clients.len(),
		}
	}

	/// Batch operation: send command to all matching connections
	pub async fn for_each<F>(&self, mut f: F)
	where
		F: FnMut(&ConnectionHandle<K>),
	{
		for entry in self.handles.iter() {
			f(entry.value());
		}
	}

	/// Shuts down every actor in the store. Called at process teardown.
	pub async fn shutdown_all(&self) {
		self.shutdown.cancel();
		for entry in self.handles.iter() {
			let _ = entry.value().shutdown().await;
		}
		self.handles.clear();
	}
}

#[derive(Debug, Clone)]
pub struct ConnectionStoreStats {
	pub total_connections: usize,
	pub active_connections: usize,
	pub stale_connections: usize,
	pub disconnected_connections: usize,
	pub unique_clients: usize,
}

impl<K: EventKey> Default for ConnectionStore<K> {
	fn default() -> Self {
		Self::new()
	}
}
