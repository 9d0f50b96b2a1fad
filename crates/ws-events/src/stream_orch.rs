#![cfg(feature = "stream-orch")]

pub mod config;
pub mod cost;
pub mod error;
pub mod orchestrator;
pub mod pool;
pub mod segmenter;

pub use config::{DeliveryOrder, OrchestratorConfig};
pub use cost::{chat_cost, estimate_tokens, tts_cost, Tier};
pub use error::{Stage, StageError};
pub use orchestrator::run;
pub use pool::{TtsOutcome, TtsPool};
