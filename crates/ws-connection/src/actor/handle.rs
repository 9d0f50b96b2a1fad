use std::{collections::HashSet, time::Duration};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::command::ConnectionCommand;
use super::error::{ConnectionError, Result};
use super::ConnectionActor;
use crate::core::conn::Connection;
use crate::core::subscription::EventKey;
use crate::types::ConnectionState;

/// Handle for communicating with a connection actor. Cheap to clone; every
/// clone shares the same command channel and cancellation token.
#[derive(Clone, Debug)]
pub struct ConnectionHandle<K: EventKey> {
	/// Snapshot of the connection as it was when the handle was created.
	/// Subscriptions and state drift from the actor's live copy as commands
	/// are processed; use `get_state`/`get_subscriptions` for current data.
	pub connection: Connection<K>,
	sender: mpsc::Sender<ConnectionCommand<K>>,
	cancel_token: CancellationToken,
}

impl<K: EventKey> ConnectionHandle<K> {
	/// Create a new connection handle and actor pair. The caller must spawn
	/// the returned actor (`tokio::spawn(actor.run())`).
	#[must_use]
	pub fn new(connection: Connection<K>, buffer_size: usize, parent_token: &CancellationToken) -> (Self, ConnectionActor<K>, CancellationToken) {
		let (sender, receiver) = mpsc::channel(buffer_size);
		let token = parent_token.child_token();

		let handle = Self {
			connection: connection.clone(),
			sender,
			cancel_token: token.clone(),
		};

		let actor = ConnectionActor::new(connection, receiver);
		(handle, actor, token)
	}

	pub async fn record_activity(&self) -> Result<()> {
		self.sender.send(ConnectionCommand::RecordActivity).await.map_err(|_| ConnectionError::ActorUnavailable)
	}

	pub async fn subscribe(&self, event_types: Vec<K>) -> Result<()> {
		self.sender.send(ConnectionCommand::Subscribe { event_types }).await.map_err(|_| ConnectionError::ActorUnavailable)
	}

	pub async fn unsubscribe(&self, event_types: Vec<K>) -> Result<()> {
		self.sender.send(ConnectionCommand::Unsubscribe { event_types }).await.map_err(|_| ConnectionError::ActorUnavailable)
	}

	pub async fn is_subscribed_to(&self, event_type: K) -> Result<bool> {
		let (tx, rx) = oneshot::channel();
		self
			.sender
			.send(ConnectionCommand::IsSubscribedTo { event_type, reply: tx })
			.await
			.map_err(|_| ConnectionError::ActorUnavailable)?;
		rx.await.map_err(|_| ConnectionError::NoReply)
	}

	pub async fn get_subscriptions(&self) -> Result<HashSet<K>> {
		let (tx, rx) = oneshot::channel();
		self.sender.send(ConnectionCommand::GetSubscriptions { reply: tx }).await.map_err(|_| ConnectionError::ActorUnavailable)?;
		rx.await.map_err(|_| ConnectionError::NoReply)
	}

	pub async fn check_stale(&self, timeout: Duration) -> Result<()> {
		self.sender.send(ConnectionCommand::CheckStale { timeout }).await.map_err(|_| ConnectionError::ActorUnavailable)
	}

	pub async fn mark_stale(&self, reason: String) -> Result<()> {
		self.sender.send(ConnectionCommand::MarkStale { reason }).await.map_err(|_| ConnectionError::ActorUnavailable)
	}

	pub async fn disconnect(&self, reason: String) -> Result<()> {
		self.sender.send(ConnectionCommand::Disconnect { reason }).await.map_err(|_| ConnectionError::ActorUnavailable)
	}

	pub async fn get_state(&self) -> Result<ConnectionState> {
		let (tx, rx) = oneshot::channel();
		self.sender.send(ConnectionCommand::GetState { reply: tx }).await.map_err(|_| ConnectionError::ActorUnavailable)?;
		rx.await.map_err(|_| ConnectionError::NoReply)
	}

	/// Request actor shutdown and cancel this connection's child token.
	pub async fn shutdown(&self) -> Result<()> {
		let _ = self.sender.send(ConnectionCommand::Shutdown).await;
		self.cancel_token.cancel();
		Ok(())
	}
}
