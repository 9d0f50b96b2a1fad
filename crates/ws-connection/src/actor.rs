pub mod command;
pub mod error;
pub mod handle;

pub use command::ConnectionCommand;
pub use error::{ConnectionError, Result};
pub use handle::ConnectionHandle;

use tokio::sync::mpsc;
use tracing;

use crate::core::conn::Connection;
use crate::core::subscription::EventKey;
use crate::types::ConnectionState;

/// Connection actor that owns its mutable `Connection<K>` exclusively, so
/// every mutation (subscribe, mark stale, disconnect) runs single-threaded
/// behind the actor's command channel rather than under a shared lock.
pub struct ConnectionActor<K: EventKey> {
	connection: Connection<K>,
	commands: mpsc::Receiver<ConnectionCommand<K>>,
}

impl<K: EventKey> ConnectionActor<K> {
	#[must_use]
	pub const fn new(connection: Connection<K>, commands: mpsc::Receiver<ConnectionCommand<K>>) -> Self {
		Self { connection, commands }
	}

	/// Run the actor event loop until `Disconnect`, `Shutdown`, or the
	/// command channel closes (every handle dropped).
	pub async fn run(mut self) {
		while let Some(cmd) = self.commands.recv().await {
			match cmd {
				ConnectionCommand::RecordActivity => self.connection.record_activity(),

				ConnectionCommand::Subscribe { event_types } => {
					let change = self.connection.subscribe(event_types);
					if change.added > 0 {
						tracing::debug!(connection_id = %self.connection.id, added = change.added, "subscribed to events");
					}
				}

				ConnectionCommand::Unsubscribe { event_types } => {
					let change = self.connection.unsubscribe(event_types);
					if change.removed > 0 {
						tracing::debug!(connection_id = %self.connection.id, removed = change.removed, "unsubscribed from events");
					}
				}

				ConnectionCommand::IsSubscribedTo { event_type, reply } => {
					let _ = reply.send(self.connection.is_subscribed_to(&event_type));
				}

				ConnectionCommand::GetSubscriptions { reply } => {
					let _ = reply.send(self.connection.get_subscriptions());
				}

				ConnectionCommand::CheckStale { timeout } => {
					if self.connection.should_be_stale(timeout) {
						self.connection.mark_stale("timeout".to_string());
						tracing::info!(connection_id = %self.connection.id, "connection marked as stale");
					}
				}

				ConnectionCommand::MarkStale { reason } => self.connection.mark_stale(reason),

				ConnectionCommand::Disconnect { reason } => {
					self.connection.disconnect(reason);
					tracing::info!(connection_id = %self.connection.id, "connection disconnected");
					break;
				}

				ConnectionCommand::GetState { reply } => {
					let _ = reply.send(self.connection.state.clone());
				}

				ConnectionCommand::Shutdown => {
					tracing::debug!(connection_id = %self.connection.id, "connection actor shutting down");
					break;
				}
			}
		}
	}
}
