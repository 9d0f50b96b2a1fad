use thiserror::Error;

/// Result type alias for connection operations
pub type Result<T> = std::result::Result<T, ConnectionError>;

/// Errors that can occur during connection actor operations
#[derive(Debug, Error, Clone, Copy)]
pub enum ConnectionError {
	/// The connection actor is no longer available (its task has exited or
	/// the channel is full and was dropped).
	#[error("connection actor unavailable")]
	ActorUnavailable,

	/// The actor dropped its reply channel without answering.
	#[error("connection actor did not reply")]
	NoReply,
}
