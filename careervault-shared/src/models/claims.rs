//! Display-only decoding of ID tokens.
//!
//! The payload is read without verifying the signature. Nothing decoded here may be
//! used to make an authorization decision; the backend verifies every token itself.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

/// Profile claims carried by an OpenID Connect ID token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdTokenClaims {
    #[serde(rename = "sub")]
    pub user_id: String,
    #[serde(rename = "cognito:username", alias = "preferred_username", default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
}

impl IdTokenClaims {
    /// Decode the payload segment of a JWT, or `None` when the token is malformed.
    #[must_use]
    pub fn decode_unverified(token: &str) -> Option<Self> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}
