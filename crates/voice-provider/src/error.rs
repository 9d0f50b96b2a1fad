use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
	#[error("provider request timed out")]
	Timeout,

	#[error("provider transport error: {0}")]
	Transport(#[from] reqwest::Error),

	#[error("provider returned malformed JSON: {0}")]
	Decode(#[from] serde_json::Error),

	#[error("provider stream ended unexpectedly: {0}")]
	StreamClosed(String),
}
