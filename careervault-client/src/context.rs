use shared::{
    config::ClientConfig,
    models::{LoginRequest, SignupRequest, User},
};
use std::sync::Arc;
use tracing::warn;

use crate::{
    api::ApiClient,
    auth::{AuthStatus, SessionManager},
    error::ClientResult,
    http::HttpTransport,
    jobs::JobStore,
    token_store::{FileTokenStore, TokenStore},
};

/// The services one signed-in user works with, wired together.
///
/// Auth transitions made through the context keep the job collection in step: it is
/// loaded on entering `Authenticated` and emptied on leaving it.
#[derive(Debug, Clone)]
pub struct AppContext {
    session: Arc<SessionManager>,
    jobs: Arc<JobStore>,
}

impl AppContext {
    /// Build the services with a file-backed token store at the configured path.
    ///
    /// # Errors
    /// Returns [`crate::ClientError::Network`] if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::with_token_store(config, Arc::new(FileTokenStore::new(config.token_path())))
    }

    /// # Errors
    /// Returns [`crate::ClientError::Network`] if the HTTP client cannot be built.
    pub fn with_token_store(
        config: &ClientConfig,
        tokens: Arc<dyn TokenStore>,
    ) -> ClientResult<Self> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::from_api(ApiClient::new(transport, tokens)))
    }

    #[must_use]
    pub fn from_api(api: ApiClient) -> Self {
        let session = Arc::new(SessionManager::new(api));
        let jobs = Arc::new(JobStore::new(session.clone()));
        Self { session, jobs }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        self.session.api()
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    #[must_use]
    pub fn jobs(&self) -> &Arc<JobStore> {
        &self.jobs
    }

    pub async fn restore(&self) -> AuthStatus {
        let status = self.session.restore().await;
        self.sync_jobs().await;
        status
    }

    /// # Errors
    /// Propagates [`SessionManager::login`] errors.
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<User> {
        let result = self.session.login(request).await;
        self.sync_jobs().await;
        result
    }

    /// # Errors
    /// Propagates [`SessionManager::signup`] errors.
    pub async fn signup(&self, request: &SignupRequest) -> ClientResult<User> {
        let result = self.session.signup(request).await;
        self.sync_jobs().await;
        result
    }

    pub async fn logout(&self) {
        self.session.logout().await;
        self.jobs.clear();
    }

    async fn sync_jobs(&self) {
        if let Err(err) = self.jobs.sync().await {
            warn!(error = %err, "could not load job applications");
        }
    }
}
