use tokio::sync::{mpsc, oneshot};

use crate::types::SessionError;

/// Lifecycle of one connection, per spec §4.5:
/// `Connected -> Idle <-> Listening/Processing -> ... -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	Connected,
	Idle,
	Listening,
	Processing,
	Closed,
}

impl SessionState {
	const fn name(self) -> &'static str {
		match self {
			Self::Connected => "connected",
			Self::Idle => "idle",
			Self::Listening => "listening",
			Self::Processing => "processing",
			Self::Closed => "closed",
		}
	}
}

#[derive(Debug, Clone, Copy)]
pub enum SessionTransition {
	Start,
	BeginListening,
	BeginProcessing,
	Complete,
	Close,
}

impl SessionTransition {
	const fn name(self) -> &'static str {
		match self {
			Self::Start => "start",
			Self::BeginListening => "begin_listening",
			Self::BeginProcessing => "begin_processing",
			Self::Complete => "complete",
			Self::Close => "close",
		}
	}
}

fn validate_transition(current: SessionState, transition: SessionTransition) -> Result<SessionState, SessionError> {
	use SessionState::{Closed, Connected, Idle, Listening, Processing};
	use SessionTransition::{BeginListening, BeginProcessing, Close, Complete, Start};

	let next = match (current, transition) {
		(Connected, Start) => Idle,
		(Idle, BeginListening) => Listening,
		(Idle | Listening, BeginProcessing) => Processing,
		(Listening, BeginListening) => Listening,
		(Processing, Complete) => Idle,
		(_, Close) => Closed,
		_ => {
			return Err(SessionError::InvalidTransition {
				from: current.name().to_string(),
				attempted: transition.name().to_string(),
			})
		}
	};

	Ok(next)
}

enum StateMessage {
	Current(oneshot::Sender<SessionState>),
	Transition(SessionTransition, oneshot::Sender<Result<SessionState, SessionError>>),
}

struct StateActor {
	state: SessionState,
	receiver: mpsc::Receiver<StateMessage>,
}

impl StateActor {
	async fn run(mut self) {
		while let Some(msg) = self.receiver.recv().await {
			match msg {
				StateMessage::Current(reply) => {
					let _ = reply.send(self.state);
				}
				StateMessage::Transition(transition, reply) => {
					let result = validate_transition(self.state, transition);
					if let Ok(next) = result {
						self.state = next;
					}
					let _ = reply.send(result);
				}
			}
		}
	}
}

/// Handle to the session's state actor. Cheap to clone; shared by the
/// connection handler, the heartbeat task, and the streaming orchestrator.
#[derive(Clone)]
pub struct StateHandle {
	sender: mpsc::Sender<StateMessage>,
}

impl StateHandle {
	#[must_use]
	pub fn new() -> Self {
		let (sender, receiver) = mpsc::channel(32);
		let actor = StateActor { state: SessionState::Connected, receiver };
		tokio::spawn(actor.run());
		Self { sender }
	}

	pub async fn current(&self) -> SessionState {
		let (tx, rx) = oneshot::channel();
		if self.sender.send(StateMessage::Current(tx)).await.is_err() {
			return SessionState::Closed;
		}
		rx.await.unwrap_or(SessionState::Closed)
	}

	pub async fn transition(&self, transition: SessionTransition) -> Result<SessionState, SessionError> {
		let (tx, rx) = oneshot::channel();
		self.sender.send(StateMessage::Transition(transition, tx)).await.map_err(|_| SessionError::ActorUnavailable)?;
		rx.await.map_err(|_| SessionError::ActorUnavailable)?
	}
}

impl Default for StateHandle {
	fn default() -> Self {
		Self::new()
	}
}
