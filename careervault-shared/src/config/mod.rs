//! # Configuration
//!
//! Where the backend lives and where the session's tokens are persisted.

pub mod client;

pub use client::{ClientConfig, ConfigError, default_token_path};
