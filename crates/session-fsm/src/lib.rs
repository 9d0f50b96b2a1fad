//! Per-connection session state machine (spec C5, §4.5): admits audio
//! through the token bucket (C2), feeds the rolling STT pipeline (C3),
//! and hands finalized utterances to the streaming orchestrator (C6).

mod core;
mod events;
mod types;

pub use core::{Emit, Session, SessionState, SessionTransition};
pub use events::{now_ts, InboundEvent, OutboundEvent};
pub use types::{AdmitOutcome, SessionError, SessionId, SessionMetrics, UtteranceTrigger};
