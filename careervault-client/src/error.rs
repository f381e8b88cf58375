use reqwest::StatusCode;
use shared::{config::ConfigError, models::FieldError};
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Everything that can go wrong between the stores and the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected before any request was sent.
    #[error("validation failed: {0}")]
    Validation(String),
    /// No usable access token and no way to obtain one.
    #[error("authentication required")]
    AuthenticationRequired,
    /// The backend answered with a non-2xx status.
    #[error("request failed with {status}: {detail}")]
    Api { status: StatusCode, detail: String },
    /// The request never completed.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The refresh token was rejected; the session is gone.
    #[error("session expired: {0}")]
    SessionExpired(String),
    #[error("job {0} is not in the local collection")]
    NotFound(String),
    #[error("token storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    /// A token response whose lifetime cannot be turned into an expiry instant.
    #[error("invalid token lifetime: {0} seconds")]
    InvalidExpiry(i64),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<FieldError> for ClientError {
    fn from(err: FieldError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Coarse classification the view layer branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    InvalidCredentials,
    Network,
    Validation,
    SessionExpired,
    Other,
}

impl ClientError {
    #[must_use]
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::Api { status, .. } if *status == StatusCode::UNAUTHORIZED => {
                AuthErrorKind::InvalidCredentials
            }
            Self::Api { status, .. }
                if *status == StatusCode::BAD_REQUEST
                    || *status == StatusCode::UNPROCESSABLE_ENTITY =>
            {
                AuthErrorKind::Validation
            }
            Self::Validation(_) => AuthErrorKind::Validation,
            Self::Network(_) => AuthErrorKind::Network,
            Self::SessionExpired(_) | Self::AuthenticationRequired => {
                AuthErrorKind::SessionExpired
            }
            _ => AuthErrorKind::Other,
        }
    }

    /// A message fit for showing inline in a form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { detail, .. } => detail.clone(),
            Self::Validation(message) => message.clone(),
            Self::Network(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            Self::SessionExpired(_) => "Your session has expired. Please sign in again.".to_string(),
            Self::AuthenticationRequired => "Please sign in to continue.".to_string(),
            other => other.to_string(),
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }

    /// Whether the stored credentials can no longer be used.
    #[must_use]
    pub fn ends_session(&self) -> bool {
        matches!(self, Self::SessionExpired(_) | Self::AuthenticationRequired) || self.is_unauthorized()
    }
}
