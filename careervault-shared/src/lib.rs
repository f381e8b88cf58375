#![cfg_attr(not(test), forbid(unsafe_code))]
#![deny(warnings, clippy::pedantic)]

//! Models and configuration shared by the CareerVault client crates.

pub mod config;
pub mod models;
