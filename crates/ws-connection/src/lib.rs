pub mod actor;
pub mod core;
pub mod types;

pub use actor::ConnectionHandle;
pub use core::conn::Connection;
pub use core::store::ConnectionStore;
pub use core::subscription::{EventKey, SubscriptionManager};
pub use types::{ClientId, ConnectionId, ConnectionState};
