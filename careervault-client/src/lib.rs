#![cfg_attr(not(test), forbid(unsafe_code))]
#![deny(warnings, clippy::pedantic)]

//! Client-side session and data layer for the CareerVault job tracker.
//!
//! [`ApiClient`] is the only component that talks to the backend and keeps the bearer
//! token fresh. [`SessionManager`] owns who is signed in and [`JobStore`] owns that
//! user's job applications. [`AppContext`] wires them together.

pub mod api;
pub mod auth;
pub mod context;
pub mod error;
pub mod http;
pub mod jobs;
pub mod stats;
pub mod strategy;
pub mod telemetry;
pub mod token_store;

pub use api::{ApiClient, JobQuery};
pub use auth::{AuthStatus, SessionManager, SessionSnapshot};
pub use context::AppContext;
pub use error::{AuthErrorKind, ClientError, ClientResult};
pub use http::{ApiRequest, HttpTransport};
pub use jobs::{JobFilter, JobStore, filter_jobs};
pub use strategy::{AuthStrategy, PasswordStrategy};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenBundle, TokenStore};
