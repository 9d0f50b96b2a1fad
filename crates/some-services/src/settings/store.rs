//! The `SettingsStore` contract (spec §3, §4.1). The store itself lives
//! outside the core (spec §1 lists persistence as an external
//! collaborator); [`super::cache::SettingsCache`] is the in-process
//! component that owns caching and invalidation on top of it.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// A flat string-to-string snapshot of recognized settings keys, per
/// spec §3 ("Settings" data model) and §6 (recognized keys).
pub type SettingsSnapshot = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("settings store backend error: {0}")]
	Backend(String),
}

/// Backing key-value store for settings. Reads are a full snapshot;
/// writes are last-write-wins (spec §3).
#[async_trait]
pub trait SettingsStore: Send + Sync {
	async fn read_all(&self) -> Result<SettingsSnapshot, SettingsError>;
	async fn write(&self, key: &str, value: &str) -> Result<(), SettingsError>;
}
