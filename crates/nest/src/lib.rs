//! Admin REST surface (spec C7 ambient surface, §6): settings CRUD, health,
//! conversation/log inspection, and provider key validation, against
//! `voice_store` and `some_services::settings::SettingsCache`.
//!
//! This crate is a library, not a standalone binary: `voice_gateway` owns
//! the single `PORT` listener and merges [`http::admin_router`] into the
//! same `axum::Router` as its WebSocket upgrade route.

pub mod config;
pub mod http;

pub use config::AdminConfig;
pub use http::{admin_router, AdminState};
