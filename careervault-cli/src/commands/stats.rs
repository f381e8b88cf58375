use anyhow::Result;
use client::AppContext;
use shared::models::JobStats;

use super::require_session;

/// Print per-status counts and rates, computed locally unless `remote` is set.
pub async fn show(context: &AppContext, remote: bool, json: bool) -> Result<()> {
    require_session(context).await?;
    let stats = if remote {
        context.jobs().remote_stats().await?
    } else {
        context.jobs().stats()
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_summary(&stats);
    }
    Ok(())
}

fn print_summary(stats: &JobStats) {
    println!("Total applications: {}", stats.total_jobs);
    for (label, count) in [
        ("Applied", stats.total_applied),
        ("Interview", stats.total_interviews),
        ("Offer", stats.total_offers),
        ("Rejected", stats.total_rejected),
    ] {
        println!("  {label:<10} {count:>4}  ({:>3}%)", stats.share_of(count));
    }
    println!("Interview rate: {}%", stats.interview_rate());
    println!("Success rate:   {}%", stats.success_rate());
}
