use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::models::{
    HealthStatus, IdTokenClaims, JobList, JobPayload, JobRecord, JobStatus, LoginRequest,
    MessageResponse, PasswordRequirements, RemoteJobStats, SignupRequest, TokenResponse, User,
};
use std::{fmt, sync::Arc};
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, ClientResult},
    http::{ApiRequest, HttpTransport},
    strategy::{AuthStrategy, PasswordStrategy},
    token_store::{TokenBundle, TokenStore},
};

/// Optional narrowing for `GET /api/jobs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobQuery {
    pub limit: Option<u32>,
    pub status: Option<JobStatus>,
}

/// Single point of contact with the backend.
///
/// Every authenticated call goes through [`ApiClient::ensure_valid_token`] first, so
/// callers never check expiry themselves.
#[derive(Clone)]
pub struct ApiClient {
    transport: HttpTransport,
    tokens: Arc<dyn TokenStore>,
    strategy: Arc<dyn AuthStrategy>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.transport.base_url().as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Client using the backend's own password authentication.
    #[must_use]
    pub fn new(transport: HttpTransport, tokens: Arc<dyn TokenStore>) -> Self {
        let strategy = Arc::new(PasswordStrategy::new(transport.clone()));
        Self::with_strategy(transport, tokens, strategy)
    }

    #[must_use]
    pub fn with_strategy(
        transport: HttpTransport,
        tokens: Arc<dyn TokenStore>,
        strategy: Arc<dyn AuthStrategy>,
    ) -> Self {
        Self {
            transport,
            tokens,
            strategy,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    #[must_use]
    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Issue `request`, attaching a valid bearer token when `requires_auth` is set.
    ///
    /// A 401 on an authenticated call clears the stored credentials before the error is
    /// returned.
    ///
    /// # Errors
    /// Propagates [`ApiClient::ensure_valid_token`] failures and every transport error.
    pub async fn request<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        requires_auth: bool,
    ) -> ClientResult<T> {
        let request = if requires_auth {
            let token = self.ensure_valid_token().await?;
            request.bearer(token)
        } else {
            request
        };

        match self.transport.send(request).await {
            Err(err) if requires_auth && err.is_unauthorized() => {
                warn!(error = %err, "backend rejected credentials; clearing stored tokens");
                self.discard_tokens();
                Err(err)
            }
            other => other,
        }
    }

    /// Return a usable access token, refreshing it first when it has expired.
    ///
    /// # Errors
    /// * [`ClientError::AuthenticationRequired`] when there is no token to use or renew.
    /// * [`ClientError::SessionExpired`] when the refresh attempt fails; the store has
    ///   been cleared by then.
    pub async fn ensure_valid_token(&self) -> ClientResult<String> {
        match self.tokens.read() {
            Some(bundle) if !bundle.is_expired_at(Utc::now()) => Ok(bundle.access_token),
            Some(bundle) if bundle.refresh_token.is_some() => {
                debug!("access token expired; refreshing");
                Ok(self.refresh().await?.access_token)
            }
            _ => Err(ClientError::AuthenticationRequired),
        }
    }

    /// Renew the access token with the stored refresh token and persist the result.
    ///
    /// # Errors
    /// * [`ClientError::AuthenticationRequired`] when no refresh token is stored.
    /// * [`ClientError::SessionExpired`] when the provider rejects the refresh; stored
    ///   credentials are cleared first.
    pub async fn refresh(&self) -> ClientResult<TokenBundle> {
        let previous = self.tokens.read();
        let Some(refresh_token) = previous.as_ref().and_then(|b| b.refresh_token.clone()) else {
            return Err(ClientError::AuthenticationRequired);
        };

        match self.strategy.refresh(&refresh_token).await {
            Ok(response) => {
                let bundle = self.persist(&response, previous.as_ref())?;
                info!(expires_at = %bundle.expires_at, "refreshed access token");
                Ok(bundle)
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed; clearing stored tokens");
                self.discard_tokens();
                Err(ClientError::SessionExpired(err.user_message()))
            }
        }
    }

    /// Store a token response. Refresh and ID tokens missing from it carry over from
    /// `previous`, since renewals may omit the unchanged refresh token.
    fn persist(
        &self,
        response: &TokenResponse,
        previous: Option<&TokenBundle>,
    ) -> ClientResult<TokenBundle> {
        let mut bundle = TokenBundle::from_response(response, Utc::now())?;
        if let Some(previous) = previous {
            if bundle.refresh_token.is_none() {
                bundle.refresh_token.clone_from(&previous.refresh_token);
            }
            if bundle.id_token.is_none() {
                bundle.id_token.clone_from(&previous.id_token);
            }
        }
        self.tokens.write(&bundle)?;
        Ok(bundle)
    }

    /// Clear stored credentials, logging instead of failing.
    pub fn discard_tokens(&self) {
        if let Err(err) = self.tokens.clear() {
            warn!(error = %err, "failed to clear stored tokens");
        }
    }

    /// Register an account. Does not sign in.
    ///
    /// # Errors
    /// Propagates strategy errors.
    pub async fn signup(&self, request: &SignupRequest) -> ClientResult<MessageResponse> {
        self.strategy.sign_up(request).await
    }

    /// Exchange credentials for tokens and persist them, replacing any previous session.
    ///
    /// # Errors
    /// Propagates strategy and storage errors.
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<TokenBundle> {
        let response = self.strategy.sign_in(request).await?;
        self.persist(&response, None)
    }

    /// Best-effort sign-out notification followed by an unconditional local clear.
    pub async fn logout(&self) {
        if let Some(bundle) = self.tokens.read() {
            if let Err(err) = self.strategy.sign_out(&bundle.access_token).await {
                warn!(error = %err, "logout notification failed");
            }
        }
        self.discard_tokens();
    }

    /// # Errors
    /// Propagates [`ApiClient::request`] errors.
    pub async fn current_user(&self) -> ClientResult<User> {
        self.request(ApiRequest::get("auth/me"), true).await
    }

    /// Profile claims from the stored ID token, for display only.
    #[must_use]
    pub fn stored_user_info(&self) -> Option<IdTokenClaims> {
        self.tokens
            .read()
            .and_then(|bundle| bundle.id_token)
            .and_then(|token| IdTokenClaims::decode_unverified(&token))
    }

    /// # Errors
    /// Propagates [`ApiClient::request`] errors.
    pub async fn list_jobs(&self, query: JobQuery) -> ClientResult<Vec<JobRecord>> {
        let mut request = ApiRequest::get("api/jobs");
        if let Some(limit) = query.limit {
            request = request.query("limit", limit);
        }
        if let Some(status) = query.status {
            request = request.query("status_filter", status);
        }
        let list: JobList = self.request(request, true).await?;
        Ok(list.into_records())
    }

    /// # Errors
    /// Propagates [`ApiClient::request`] errors.
    pub async fn get_job(&self, id: &str) -> ClientResult<JobRecord> {
        self.request(ApiRequest::get(format!("api/jobs/{id}")), true)
            .await
    }

    /// # Errors
    /// Propagates [`ApiClient::request`] errors.
    pub async fn create_job(&self, payload: &JobPayload) -> ClientResult<JobRecord> {
        self.request(ApiRequest::post("api/jobs").json(payload)?, true)
            .await
    }

    /// # Errors
    /// Propagates [`ApiClient::request`] errors.
    pub async fn update_job(&self, id: &str, payload: &JobPayload) -> ClientResult<JobRecord> {
        self.request(ApiRequest::put(format!("api/jobs/{id}")).json(payload)?, true)
            .await
    }

    /// # Errors
    /// Propagates [`ApiClient::request`] errors.
    pub async fn update_job_status(&self, id: &str, status: JobStatus) -> ClientResult<JobRecord> {
        let request = ApiRequest::patch(format!("api/jobs/{id}/status")).query("new_status", status);
        self.request(request, true).await
    }

    /// # Errors
    /// Propagates [`ApiClient::request`] errors.
    pub async fn delete_job(&self, id: &str) -> ClientResult<()> {
        let _: Value = self
            .request(ApiRequest::delete(format!("api/jobs/{id}")), true)
            .await?;
        Ok(())
    }

    /// # Errors
    /// Propagates [`ApiClient::request`] errors.
    pub async fn jobs_by_status(
        &self,
        status: JobStatus,
        limit: Option<u32>,
    ) -> ClientResult<Vec<JobRecord>> {
        let mut request = ApiRequest::get(format!("api/jobs/status/{status}"));
        if let Some(limit) = limit {
            request = request.query("limit", limit);
        }
        let list: JobList = self.request(request, true).await?;
        Ok(list.into_records())
    }

    /// # Errors
    /// Propagates [`ApiClient::request`] errors.
    pub async fn bulk_update_status(
        &self,
        ids: &[String],
        status: JobStatus,
    ) -> ClientResult<MessageResponse> {
        let request = ApiRequest::post("api/jobs/bulk/status-update")
            .query("new_status", status)
            .json(ids)?;
        self.request(request, true).await
    }

    /// # Errors
    /// Propagates [`ApiClient::request`] errors.
    pub async fn bulk_delete(&self, ids: &[String]) -> ClientResult<MessageResponse> {
        self.request(ApiRequest::delete("api/jobs/bulk").json(ids)?, true)
            .await
    }

    /// Server-side counts per status.
    ///
    /// # Errors
    /// Propagates [`ApiClient::request`] errors.
    pub async fn job_stats(&self) -> ClientResult<RemoteJobStats> {
        self.request(ApiRequest::get("api/jobs/stats"), true).await
    }

    /// # Errors
    /// Propagates [`ApiClient::request`] errors.
    pub async fn password_requirements(&self) -> ClientResult<PasswordRequirements> {
        self.request(ApiRequest::get("auth/password-requirements"), false)
            .await
    }

    /// # Errors
    /// Propagates [`ApiClient::request`] errors.
    pub async fn health(&self) -> ClientResult<HealthStatus> {
        self.request(ApiRequest::get("health"), false).await
    }
}
