use std::sync::Arc;

use nest::AdminState;
use some_services::SettingsCache;
use tokio_util::sync::CancellationToken;
use voice_provider::ProviderAdapter;
use voice_store::{ConversationLog, SqliteVoiceStore};
use ws_conn_manager::ConnectionGuard;
use ws_connection::ConnectionStore;

use crate::config::Config;

/// Everything a WebSocket connection or admin request needs, built once in
/// `main` and shared behind `Arc`/cheap clones (spec §5: the settings
/// cache is the only process-wide resource; everything else here is
/// either a registry or a stateless adapter).
#[derive(Clone)]
pub struct AppState {
	pub config: Arc<Config>,
	pub admin: AdminState,
	pub provider: Arc<dyn ProviderAdapter>,
	pub conversations: Arc<dyn ConversationLog>,
	pub connection_guard: ConnectionGuard,
	/// Low-level per-socket registry (C7): tracks accept time, client id,
	/// and liveness independently of the session-level state machine
	/// owned by `session-fsm::Session`.
	pub connections: Arc<ConnectionStore<String>>,
	pub shutdown: CancellationToken,
}

impl AppState {
	#[must_use]
	pub fn new(config: Config, store: Arc<SqliteVoiceStore>, provider: Arc<dyn ProviderAdapter>) -> Self {
		let settings = Arc::new(SettingsCache::new(store.clone()));
		let conversations: Arc<dyn ConversationLog> = store.clone();
		let admin = AdminState::new(settings, conversations.clone(), store.clone());

		Self {
			config: Arc::new(config),
			admin,
			provider,
			conversations,
			connection_guard: ConnectionGuard::new(),
			connections: Arc::new(ConnectionStore::new()),
			shutdown: CancellationToken::new(),
		}
	}
}
