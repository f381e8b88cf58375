use async_trait::async_trait;
use serde_json::Value;
use shared::models::{
    LoginRequest, MessageResponse, RefreshRequest, SignupRequest, TokenResponse,
};

use crate::{
    error::ClientResult,
    http::{ApiRequest, HttpTransport},
};

/// How the client obtains, renews and gives up credentials.
///
/// The session manager only ever talks to this seam, so an identity provider with its
/// own flows can replace [`PasswordStrategy`] without touching the stores.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Register a new account.
    async fn sign_up(&self, request: &SignupRequest) -> ClientResult<MessageResponse>;

    /// Exchange credentials for a token bundle.
    async fn sign_in(&self, request: &LoginRequest) -> ClientResult<TokenResponse>;

    /// Tell the provider the session is over.
    async fn sign_out(&self, access_token: &str) -> ClientResult<()>;

    /// Trade a refresh token for a fresh access token.
    async fn refresh(&self, refresh_token: &str) -> ClientResult<TokenResponse>;
}

/// Username/password auth against the backend's `/auth/*` endpoints.
#[derive(Debug, Clone)]
pub struct PasswordStrategy {
    transport: HttpTransport,
}

impl PasswordStrategy {
    #[must_use]
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl AuthStrategy for PasswordStrategy {
    async fn sign_up(&self, request: &SignupRequest) -> ClientResult<MessageResponse> {
        self.transport
            .send(ApiRequest::post("auth/signup").json(request)?)
            .await
    }

    async fn sign_in(&self, request: &LoginRequest) -> ClientResult<TokenResponse> {
        self.transport
            .send(ApiRequest::post("auth/login").json(request)?)
            .await
    }

    async fn sign_out(&self, access_token: &str) -> ClientResult<()> {
        let _: Value = self
            .transport
            .send(ApiRequest::post("auth/logout").bearer(access_token))
            .await?;
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> ClientResult<TokenResponse> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.transport
            .send(ApiRequest::post("auth/refresh").json(&body)?)
            .await
    }
}
