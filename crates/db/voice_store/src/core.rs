pub mod model;
pub mod queries;
pub mod repository;
pub mod schema;

pub use model::{ConversationEntry, LogEntry, NewConversationEntry, NewLogEntry, Role};
pub use repository::{ConversationLog, EventLog, SqliteVoiceStore, StoreError};
pub use schema::init_schema;
