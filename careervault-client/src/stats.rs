use shared::models::{JobApplication, JobStats, JobStatus};

/// Count `jobs` per status. Safe on an empty slice.
#[must_use]
pub fn aggregate(jobs: &[JobApplication]) -> JobStats {
    jobs.iter().fold(
        JobStats {
            total_jobs: jobs.len() as u64,
            ..JobStats::default()
        },
        |mut stats, job| {
            match job.status {
                JobStatus::Applied => stats.total_applied += 1,
                JobStatus::Interview => stats.total_interviews += 1,
                JobStatus::Offer => stats.total_offers += 1,
                JobStatus::Rejected => stats.total_rejected += 1,
            }
            stats
        },
    )
}
