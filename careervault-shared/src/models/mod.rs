pub mod auth;
pub mod claims;
pub mod errors;
pub mod job;
pub mod stats;
pub mod user;

pub use auth::{
    HealthStatus, LoginRequest, MessageResponse, PasswordRequirements, RefreshRequest,
    SignupRequest, TokenResponse,
};
pub use claims::IdTokenClaims;
pub use errors::{ErrorResponse, FieldError};
pub use job::{JobApplication, JobDraft, JobList, JobPayload, JobRecord, JobStatus};
pub use stats::{JobStats, RemoteJobStats};
pub use user::User;

use serde::{Deserialize, Deserializer};

/// Backend identifiers arrive as strings (DynamoDB, Cognito) or integers (SQL backends).
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(value) => value,
        RawId::Number(value) => value.to_string(),
    })
}
