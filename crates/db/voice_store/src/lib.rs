pub mod core;

pub use core::{ConversationEntry, ConversationLog, EventLog, LogEntry, NewConversationEntry, NewLogEntry, Role, SqliteVoiceStore, StoreError};
