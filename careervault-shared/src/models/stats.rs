use serde::{Deserialize, Serialize};

/// Per-status counts over a job collection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub total_jobs: u64,
    pub total_applied: u64,
    pub total_interviews: u64,
    pub total_offers: u64,
    pub total_rejected: u64,
}

impl JobStats {
    /// `count` as a whole percentage of all jobs. An empty collection divides by one.
    #[must_use]
    pub fn share_of(&self, count: u64) -> u64 {
        let total = self.total_jobs.max(1);
        (count * 100 + total / 2) / total
    }

    #[must_use]
    pub fn interview_rate(&self) -> u64 {
        self.share_of(self.total_interviews)
    }

    /// Offers as a share of all applications.
    #[must_use]
    pub fn success_rate(&self) -> u64 {
        self.share_of(self.total_offers)
    }

    #[must_use]
    pub fn rejection_rate(&self) -> u64 {
        self.share_of(self.total_rejected)
    }
}

/// Counts reported by `GET /api/jobs/stats`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteJobStats {
    #[serde(rename = "Applied", default)]
    pub applied: u64,
    #[serde(rename = "Interview", default)]
    pub interview: u64,
    #[serde(rename = "Offer", default)]
    pub offer: u64,
    #[serde(rename = "Rejected", default)]
    pub rejected: u64,
    #[serde(default)]
    pub total: Option<u64>,
}

impl From<RemoteJobStats> for JobStats {
    fn from(remote: RemoteJobStats) -> Self {
        let summed = remote.applied + remote.interview + remote.offer + remote.rejected;
        Self {
            total_jobs: remote.total.unwrap_or(summed),
            total_applied: remote.applied,
            total_interviews: remote.interview,
            total_offers: remote.offer,
            total_rejected: remote.rejected,
        }
    }
}
