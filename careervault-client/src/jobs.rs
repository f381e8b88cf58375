//! In-memory copy of the signed-in user's job applications.

use serde::Serialize;
use shared::models::{JobApplication, JobDraft, JobPayload, JobStats, JobStatus, MessageResponse};
use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, PoisonError, RwLock},
};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{
    api::JobQuery,
    auth::{AuthStatus, SessionManager},
    error::{ClientError, ClientResult},
    stats,
};

/// Filter parameters. An empty string places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobFilter {
    /// Case-insensitive substring of title or company.
    pub search: String,
    /// Exact status name.
    pub status: String,
    /// Exact company name.
    pub company: String,
}

impl JobFilter {
    pub fn new(
        search: impl Into<String>,
        status: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            search: search.into(),
            status: status.into(),
            company: company.into(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.status.is_empty() && self.company.is_empty()
    }

    #[must_use]
    pub fn matches(&self, job: &JobApplication) -> bool {
        let search = self.search.to_lowercase();
        let matches_search = search.is_empty()
            || job.title.to_lowercase().contains(&search)
            || job.company.to_lowercase().contains(&search);
        let matches_status = self.status.is_empty() || job.status.as_str() == self.status;
        let matches_company = self.company.is_empty() || job.company == self.company;

        matches_search && matches_status && matches_company
    }
}

/// Jobs from `jobs` accepted by `filter`, in their original order.
#[must_use]
pub fn filter_jobs(jobs: &[JobApplication], filter: &JobFilter) -> Vec<JobApplication> {
    jobs.iter().filter(|job| filter.matches(job)).cloned().collect()
}

#[derive(Debug, Default)]
struct Collection {
    all: Vec<JobApplication>,
    filtered: Vec<JobApplication>,
    filter: JobFilter,
    loading: bool,
    error: Option<String>,
}

impl Collection {
    fn recompute(&mut self) {
        self.filtered = filter_jobs(&self.all, &self.filter);
    }

    fn replace_all(&mut self, jobs: Vec<JobApplication>) {
        self.all = jobs;
        self.recompute();
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.all.iter().position(|job| job.id == id)
    }
}

/// Authoritative client-side job collection, kept in step with the backend.
///
/// Failed backend calls never modify the collection. Every change bumps a revision
/// counter that views can watch to re-render statistics.
///
/// The store follows the session's status channel: once the session changes after the
/// last load, the collection is emptied before it is next read or written.
#[derive(Debug)]
pub struct JobStore {
    session: Arc<SessionManager>,
    session_events: Mutex<watch::Receiver<AuthStatus>>,
    state: RwLock<Collection>,
    revision: watch::Sender<u64>,
}

impl JobStore {
    #[must_use]
    pub fn new(session: Arc<SessionManager>) -> Self {
        let (revision, _) = watch::channel(0);
        let session_events = Mutex::new(session.subscribe());
        Self {
            session,
            session_events,
            state: RwLock::new(Collection::default()),
            revision,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Receiver of the revision counter; it moves on every collection change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    #[must_use]
    pub fn all_jobs(&self) -> Vec<JobApplication> {
        self.read(|c| c.all.clone())
    }

    #[must_use]
    pub fn filtered_jobs(&self) -> Vec<JobApplication> {
        self.read(|c| c.filtered.clone())
    }

    #[must_use]
    pub fn filter_params(&self) -> JobFilter {
        self.read(|c| c.filter.clone())
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.read(|c| c.loading)
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.read(|c| c.error.clone())
    }

    pub fn clear_error(&self) {
        self.write(|c| c.error = None);
    }

    /// Load when the session is authenticated, empty the collection otherwise.
    ///
    /// # Errors
    /// Propagates [`JobStore::load`] failures.
    pub async fn sync(&self) -> ClientResult<()> {
        if self.session.status() == AuthStatus::Authenticated {
            self.load().await.map(|_| ())
        } else {
            self.clear();
            Ok(())
        }
    }

    /// Fetch the full list and replace the collection with it.
    ///
    /// # Errors
    /// Returns the gateway error after recording it on the store.
    #[instrument(skip(self))]
    pub async fn load(&self) -> ClientResult<Vec<JobApplication>> {
        self.write(|c| c.loading = true);
        let records = self
            .session
            .api()
            .list_jobs(JobQuery::default())
            .await
            .map_err(|err| self.fail(err))?;

        let jobs: Vec<JobApplication> = records.into_iter().map(Into::into).collect();
        info!(count = jobs.len(), "loaded job applications");
        self.commit(|c| {
            c.replace_all(jobs.clone());
            c.error = None;
        });
        Ok(jobs)
    }

    /// Reload from the backend. Requires an authenticated session.
    ///
    /// # Errors
    /// [`ClientError::AuthenticationRequired`] without a session, otherwise as [`JobStore::load`].
    pub async fn refresh(&self) -> ClientResult<Vec<JobApplication>> {
        self.require_session()?;
        self.load().await
    }

    /// Drop every job and reset the filter.
    pub fn clear(&self) {
        self.commit(|c| *c = Collection::default());
        debug!("job collection cleared");
    }

    /// Fetch one job by id.
    ///
    /// # Errors
    /// Returns the gateway error after recording it on the store.
    pub async fn get(&self, id: &str) -> ClientResult<JobApplication> {
        self.require_session()?;
        let record = self
            .session
            .api()
            .get_job(id)
            .await
            .map_err(|err| self.fail(err))?;
        Ok(record.into())
    }

    /// Create a job and append the backend's copy, id included.
    ///
    /// # Errors
    /// * [`ClientError::AuthenticationRequired`] without a session.
    /// * [`ClientError::Validation`] when the draft is rejected locally.
    /// * Any gateway error.
    #[instrument(skip_all, fields(company = %draft.company))]
    pub async fn create(&self, draft: &JobDraft) -> ClientResult<JobApplication> {
        self.require_session()?;
        draft.validate().map_err(|err| self.fail(err.into()))?;

        let record = self
            .session
            .api()
            .create_job(&JobPayload::from(draft))
            .await
            .map_err(|err| self.fail(err))?;

        let job = JobApplication::from(record);
        info!(job_id = %job.id, "created job application");
        self.commit(|c| {
            c.all.push(job.clone());
            c.recompute();
            c.error = None;
        });
        Ok(job)
    }

    /// Replace the job `id` with `draft`.
    ///
    /// # Errors
    /// As [`JobStore::create`], plus [`ClientError::NotFound`] when the backend accepted
    /// the update but `id` is not in the local collection; nothing local changes then.
    #[instrument(skip(self, draft))]
    pub async fn update(&self, id: &str, draft: &JobDraft) -> ClientResult<JobApplication> {
        self.require_session()?;
        draft.validate().map_err(|err| self.fail(err.into()))?;

        let record = self
            .session
            .api()
            .update_job(id, &JobPayload::from(draft))
            .await
            .map_err(|err| self.fail(err))?;
        self.replace_local(id, record.into())
    }

    /// Move the job `id` to `status`.
    ///
    /// # Errors
    /// As [`JobStore::update`].
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: &str, status: JobStatus) -> ClientResult<JobApplication> {
        self.require_session()?;
        let record = self
            .session
            .api()
            .update_job_status(id, status)
            .await
            .map_err(|err| self.fail(err))?;
        self.replace_local(id, record.into())
    }

    /// # Errors
    /// [`ClientError::AuthenticationRequired`] without a session, or any gateway error.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        self.require_session()?;
        self.session
            .api()
            .delete_job(id)
            .await
            .map_err(|err| self.fail(err))?;

        self.commit(|c| {
            c.all.retain(|job| job.id != id);
            c.recompute();
            c.error = None;
        });
        info!(job_id = %id, "deleted job application");
        Ok(())
    }

    /// Set `status` on every job in `ids`.
    ///
    /// # Errors
    /// [`ClientError::AuthenticationRequired`] without a session, or any gateway error.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn bulk_update_status(
        &self,
        ids: &[String],
        status: JobStatus,
    ) -> ClientResult<MessageResponse> {
        self.require_session()?;
        let response = self
            .session
            .api()
            .bulk_update_status(ids, status)
            .await
            .map_err(|err| self.fail(err))?;

        self.commit(|c| {
            for job in c.all.iter_mut().filter(|job| ids.contains(&job.id)) {
                job.status = status;
            }
            c.recompute();
            c.error = None;
        });
        Ok(response)
    }

    /// Delete every job in `ids`.
    ///
    /// # Errors
    /// [`ClientError::AuthenticationRequired`] without a session, or any gateway error.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn bulk_delete(&self, ids: &[String]) -> ClientResult<MessageResponse> {
        self.require_session()?;
        let response = self
            .session
            .api()
            .bulk_delete(ids)
            .await
            .map_err(|err| self.fail(err))?;

        self.commit(|c| {
            c.all.retain(|job| !ids.contains(&job.id));
            c.recompute();
            c.error = None;
        });
        Ok(response)
    }

    /// Apply a new filter and return the matching jobs. Never refetches.
    pub fn filter(
        &self,
        search: impl Into<String>,
        status: impl Into<String>,
        company: impl Into<String>,
    ) -> Vec<JobApplication> {
        let filter = JobFilter::new(search, status, company);
        self.write(|c| {
            c.filter = filter;
            c.recompute();
            c.filtered.clone()
        })
    }

    /// Distinct companies, sorted.
    #[must_use]
    pub fn companies(&self) -> Vec<String> {
        self.read(|c| {
            c.all
                .iter()
                .map(|job| job.company.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        })
    }

    /// Distinct statuses present, sorted by name.
    #[must_use]
    pub fn statuses(&self) -> Vec<JobStatus> {
        self.read(|c| {
            c.all
                .iter()
                .map(|job| job.status)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        })
    }

    #[must_use]
    pub fn stats(&self) -> JobStats {
        self.read(|c| stats::aggregate(&c.all))
    }

    /// Counts computed by the backend instead of the local collection.
    ///
    /// # Errors
    /// Returns the gateway error after recording it on the store.
    pub async fn remote_stats(&self) -> ClientResult<JobStats> {
        self.require_session()?;
        let remote = self
            .session
            .api()
            .job_stats()
            .await
            .map_err(|err| self.fail(err))?;
        Ok(remote.into())
    }

    fn require_session(&self) -> ClientResult<()> {
        if self.session.status() == AuthStatus::Authenticated {
            Ok(())
        } else {
            Err(self.fail(ClientError::AuthenticationRequired))
        }
    }

    fn replace_local(&self, id: &str, job: JobApplication) -> ClientResult<JobApplication> {
        let replaced = self.write(|c| {
            let index = c.position(id)?;
            c.all[index] = job.clone();
            c.recompute();
            c.error = None;
            Some(())
        });

        if replaced.is_some() {
            self.bump();
            info!(job_id = %id, "updated job application");
            Ok(job)
        } else {
            warn!(job_id = %id, "backend updated a job missing from the local collection");
            Err(self.fail(ClientError::NotFound(id.to_string())))
        }
    }

    /// Record `err` for display. Errors that end the session also end it here and empty
    /// the collection.
    fn fail(&self, err: ClientError) -> ClientError {
        let message = err.user_message();
        if err.ends_session() {
            self.session.observe_error(&err);
            self.clear();
        }
        self.write(|c| {
            c.loading = false;
            c.error = Some(message);
        });
        err
    }

    fn commit(&self, f: impl FnOnce(&mut Collection)) {
        self.write(|c| {
            f(c);
            c.loading = false;
        });
        self.bump();
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    /// Drop jobs that belong to a session which has since changed.
    fn follow_session(&self) {
        let changed = {
            let mut events = self
                .session_events
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let changed = events.has_changed().unwrap_or(false);
            if changed {
                events.mark_unchanged();
            }
            changed
        };
        if !changed {
            return;
        }

        let dropped = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let dropped = state.all.len();
            *state = Collection::default();
            dropped
        };
        if dropped > 0 {
            debug!(
                dropped,
                status = %self.session.status(),
                "session changed; job collection emptied"
            );
            self.bump();
        }
    }

    fn read<R>(&self, f: impl FnOnce(&Collection) -> R) -> R {
        self.follow_session();
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<R>(&self, f: impl FnOnce(&mut Collection) -> R) -> R {
        self.follow_session();
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner))
    }
}
