#[cfg(feature = "stream-orch")]
pub mod stream_orch;
