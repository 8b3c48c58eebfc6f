// src/lib.rs
// Tandem client core: session directory, transcript cache, translation
// overlay, and the admin console client, over the backend REST contract.

pub mod api;
pub mod chat;
pub mod config;
