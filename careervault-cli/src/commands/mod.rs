pub mod completion;
pub mod config;
pub mod jobs;
pub mod session;
pub mod stats;

use anyhow::{Result, bail};
use client::{AppContext, AuthStatus};

/// Resume the stored session, failing with a hint when there is none.
pub async fn require_session(context: &AppContext) -> Result<()> {
    if context.restore().await != AuthStatus::Authenticated {
        bail!("no active session; run `careervault session login` first");
    }
    Ok(())
}

pub async fn health(context: &AppContext) -> Result<()> {
    let health = context.api().health().await?;
    match health.service {
        Some(service) => println!("{service}: {}", health.status),
        None => println!("{}", health.status),
    }
    Ok(())
}
