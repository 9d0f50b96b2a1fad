pub mod rate_limiter;
pub mod settings;

pub use rate_limiter::admission::TokenBucket;
pub use settings::{SettingsCache, SettingsError, SettingsSnapshot, SettingsStore};
