pub mod cache;
pub mod store;

pub use cache::SettingsCache;
pub use store::{SettingsError, SettingsSnapshot, SettingsStore};
