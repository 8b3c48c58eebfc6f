// src/api/mod.rs
// Backend REST contract: transport, error normalization, wire types, and
// per-area endpoint traits.

pub mod admin;
pub mod chat;
pub mod client;
pub mod error;
pub mod translation;
pub mod types;

pub use admin::AdminApi;
pub use chat::ChatApi;
pub use client::HttpClient;
pub use error::{ApiError, ApiResult};
pub use translation::TranslationApi;
