use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::core::subscription::EventKey;
use crate::types::ConnectionState;

/// Messages that can be sent to a connection actor
#[derive(Debug)]
pub enum ConnectionCommand<K: EventKey> {
	/// Record activity (ping received)
	RecordActivity,

	/// Subscribe to events
	Subscribe { event_types: Vec<K> },

	/// Unsubscribe from events
	Unsubscribe { event_types: Vec<K> },

	/// Check whether the given event type is currently subscribed
	IsSubscribedTo { event_type: K, reply: oneshot::Sender<bool> },

	/// Get the full subscription set
	GetSubscriptions { reply: oneshot::Sender<HashSet<K>> },

	/// Check if should be marked stale
	CheckStale { timeout: Duration },

	/// Mark as stale
	MarkStale { reason: String },

	/// Disconnect
	Disconnect { reason: String },

	/// Get current state
	GetState { reply: oneshot::Sender<ConnectionState> },

	/// Shutdown the actor
	Shutdown,
}
