use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use url::Url;

use super::{FieldError, deserialize_id};

const MAX_NAME_LEN: usize = 100;
const MAX_LINK_LEN: usize = 500;
const MAX_NOTES_LEN: usize = 1000;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Pipeline stage of a job application.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum JobStatus {
    #[default]
    Applied,
    Interview,
    Offer,
    Rejected,
}

impl JobStatus {
    /// Every status, in lexicographic order of its wire name.
    pub const ALL: [Self; 4] = [Self::Applied, Self::Interview, Self::Offer, Self::Rejected];

    /// Return the wire representation used by the backend.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "Applied",
            Self::Interview => "Interview",
            Self::Offer => "Offer",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = FieldError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| {
                FieldError::new(
                    "status",
                    format!("unknown status '{value}' (expected Applied, Interview, Offer or Rejected)"),
                )
            })
    }
}

/// A tracked job application in the shape the client works with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    /// Backend-issued identifier.
    pub id: String,
    /// Position title.
    pub title: String,
    /// Company name.
    pub company: String,
    /// Current pipeline stage.
    pub status: JobStatus,
    /// Date the application was submitted (`YYYY-MM-DD`).
    pub date_applied: String,
    /// Link to the job posting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_link: Option<String>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A job application as the backend stores and returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobRecord {
    #[serde(alias = "job_id", deserialize_with = "deserialize_id")]
    pub id: String,
    pub position: String,
    pub company: String,
    pub status: JobStatus,
    #[serde(default)]
    pub applied_date: Option<String>,
    #[serde(default)]
    pub application_link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<JobRecord> for JobApplication {
    fn from(record: JobRecord) -> Self {
        Self {
            id: record.id,
            title: record.position,
            company: record.company,
            status: record.status,
            date_applied: record.applied_date.unwrap_or_default(),
            application_link: record.application_link,
            notes: record.notes,
        }
    }
}

/// List bodies come back either bare or wrapped in a paginated envelope.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum JobList {
    Plain(Vec<JobRecord>),
    Paged { jobs: Vec<JobRecord> },
}

impl JobList {
    #[must_use]
    pub fn into_records(self) -> Vec<JobRecord> {
        match self {
            Self::Plain(jobs) | Self::Paged { jobs } => jobs,
        }
    }
}

/// User input for creating or replacing a job application.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobDraft {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub status: Option<JobStatus>,
    pub date_applied: String,
    #[serde(default)]
    pub application_link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl JobDraft {
    /// Check the draft against the backend's field rules before any request is made.
    ///
    /// # Errors
    /// Returns the first [`FieldError`] found.
    pub fn validate(&self) -> Result<(), FieldError> {
        required("title", &self.title)?;
        required("company", &self.company)?;

        NaiveDate::parse_from_str(self.date_applied.trim(), DATE_FORMAT).map_err(|_| {
            FieldError::new("dateApplied", "date must be in YYYY-MM-DD format")
        })?;

        if let Some(link) = non_empty(self.application_link.as_deref()) {
            if link.chars().count() > MAX_LINK_LEN {
                return Err(FieldError::new(
                    "applicationLink",
                    format!("must be at most {MAX_LINK_LEN} characters"),
                ));
            }
            Url::parse(link)
                .map_err(|err| FieldError::new("applicationLink", format!("invalid URL: {err}")))?;
        }

        if let Some(notes) = non_empty(self.notes.as_deref()) {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(FieldError::new(
                    "notes",
                    format!("must be at most {MAX_NOTES_LEN} characters"),
                ));
            }
        }

        Ok(())
    }
}

impl From<&JobApplication> for JobDraft {
    fn from(job: &JobApplication) -> Self {
        Self {
            title: job.title.clone(),
            company: job.company.clone(),
            status: Some(job.status),
            date_applied: job.date_applied.clone(),
            application_link: job.application_link.clone(),
            notes: job.notes.clone(),
        }
    }
}

/// Request body for `POST /api/jobs` and `PUT /api/jobs/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobPayload {
    pub company: String,
    pub position: String,
    pub status: JobStatus,
    pub applied_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_link: Option<String>,
    pub notes: Option<String>,
}

impl From<&JobDraft> for JobPayload {
    fn from(draft: &JobDraft) -> Self {
        Self {
            company: draft.company.trim().to_string(),
            position: draft.title.trim().to_string(),
            status: draft.status.unwrap_or_default(),
            applied_date: draft.date_applied.trim().to_string(),
            application_link: non_empty(draft.application_link.as_deref()).map(str::to_string),
            notes: non_empty(draft.notes.as_deref()).map(str::to_string),
        }
    }
}

fn required(field: &'static str, value: &str) -> Result<(), FieldError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(FieldError::new(field, "is required"));
    }
    if len > MAX_NAME_LEN {
        return Err(FieldError::new(
            field,
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
