use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use some_services::SettingsCache;
use voice_store::{ConversationLog, EventLog};

/// Shared state for the admin REST surface (spec §6). One instance is
/// built in `voice_gateway` and mounted alongside the WebSocket route so
/// both surfaces share a single `PORT` listener.
#[derive(Clone)]
pub struct AdminState {
	pub settings: Arc<SettingsCache>,
	pub conversations: Arc<dyn ConversationLog>,
	pub logs: Arc<dyn EventLog>,
	pub http_client: reqwest::Client,
	provider_valid: Arc<AtomicBool>,
	started_at: Instant,
}

impl AdminState {
	#[must_use]
	pub fn new(settings: Arc<SettingsCache>, conversations: Arc<dyn ConversationLog>, logs: Arc<dyn EventLog>) -> Self {
		Self {
			settings,
			conversations,
			logs,
			http_client: reqwest::Client::new(),
			provider_valid: Arc::new(AtomicBool::new(false)),
			started_at: Instant::now(),
		}
	}

	#[must_use]
	pub fn provider_valid(&self) -> bool {
		self.provider_valid.load(Ordering::Relaxed)
	}

	pub fn set_provider_valid(&self, valid: bool) {
		self.provider_valid.store(valid, Ordering::Relaxed);
	}

	#[must_use]
	pub fn uptime_secs(&self) -> u64 {
		self.started_at.elapsed().as_secs()
	}
}
