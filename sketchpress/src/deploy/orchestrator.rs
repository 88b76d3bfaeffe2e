//! Deployment orchestrator
//!
//! Drives one content snapshot through repository check, creation, upload
//! and hosting activation. Every step is check-before-act or conditioned on
//! a revision tag, so a failed run can simply be started again.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, info_span, warn, Instrument};

use crate::deploy::cancel::CancelSignal;
use crate::deploy::fsm::{DeploymentEvent, DeploymentFsm};
use crate::deploy::guard::InFlightRegistry;
use crate::errors::{DeployError, HostError};
use crate::host::{FileLookup, HostingOutcome, PutOutcome, RemoteResourceClient, RepoLookup};
use crate::models::{
    CreateRepositoryOptions, DeployableContent, LiveDeploymentHandle, RepositoryRef, RevisionTag,
};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::utils::{new_run_id, PollBackoff};

/// Wait after creating a repository before writing to it
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Upper bound on remote calls of a single step
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// `put_file` attempts per run: the first write plus one conflict retry
pub const MAX_PUT_ATTEMPTS: u32 = 2;

/// How to wait for a freshly created repository
#[derive(Debug, Clone)]
pub enum SettleStrategy {
    /// Sleep a fixed delay
    Fixed(Duration),

    /// Poll `get_repository` until found, backing off between polls.
    /// Gives up silently after `attempts` and lets the upload decide.
    Poll {
        attempts: u32,
        backoff: PollBackoff,
    },
}

impl Default for SettleStrategy {
    fn default() -> Self {
        SettleStrategy::Fixed(DEFAULT_SETTLE_DELAY)
    }
}

/// Orchestrator settings
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub call_timeout: Duration,
    pub settle: SettleStrategy,
    pub branch: String,
    pub site_path: String,
    pub file_path: String,
    pub pages_domain: String,
    pub create_options: CreateRepositoryOptions,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            settle: SettleStrategy::default(),
            branch: "main".to_string(),
            site_path: "/".to_string(),
            file_path: "index.html".to_string(),
            pages_domain: "github.io".to_string(),
            create_options: CreateRepositoryOptions::default(),
        }
    }
}

/// Deployment orchestrator
pub struct Orchestrator {
    client: Arc<dyn RemoteResourceClient>,
    settings: OrchestratorSettings,
    in_flight: Arc<InFlightRegistry>,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn RemoteResourceClient>, settings: OrchestratorSettings) -> Self {
        Self {
            client,
            settings,
            in_flight: Arc::new(InFlightRegistry::new()),
        }
    }

    /// Whether a run for `repo` is underway
    pub fn is_deploying(&self, repo: &RepositoryRef) -> bool {
        self.in_flight.is_active(repo)
    }

    /// Live URL for `repo`
    pub fn live_url(&self, repo: &RepositoryRef) -> String {
        repo.pages_url(&self.settings.pages_domain)
    }

    /// Deploy to a user-supplied `"owner/name"` path.
    /// A malformed path fails before any remote call.
    pub async fn deploy_path(
        &self,
        path: &str,
        content: &DeployableContent,
        sink: &dyn ProgressSink,
        cancel: &CancelSignal,
    ) -> Result<LiveDeploymentHandle, DeployError> {
        match RepositoryRef::parse(path) {
            Ok(repo) => self.deploy(&repo, content, sink, cancel).await,
            Err(err) => {
                warn!("Rejecting deployment: {}", err);
                sink.on_progress(&ProgressEvent::failed(&err));
                Err(err)
            }
        }
    }

    /// Deploy `content` to `repo`.
    ///
    /// Progress events are delivered to `sink` on the calling task. The last
    /// event is either `Complete` or carries an error.
    pub async fn deploy(
        &self,
        repo: &RepositoryRef,
        content: &DeployableContent,
        sink: &dyn ProgressSink,
        cancel: &CancelSignal,
    ) -> Result<LiveDeploymentHandle, DeployError> {
        if content.is_empty() {
            let err = DeployError::Validation("content is empty".to_string());
            sink.on_progress(&ProgressEvent::failed(&err));
            return Err(err);
        }

        let Some(_guard) = self.in_flight.try_acquire(repo) else {
            let err = DeployError::AlreadyInFlight(repo.to_string());
            warn!("Rejecting deployment of {}: another run is in flight", repo);
            sink.on_progress(&ProgressEvent::failed(&err));
            return Err(err);
        };

        let span = info_span!("deploy", run_id = %new_run_id(), repo = %repo);
        async {
            info!("Deploying {} bytes (sha256 {})", content.len(), content.digest());

            let mut fsm = DeploymentFsm::new();
            match self.run(&mut fsm, repo, content, sink, cancel).await {
                Ok(handle) => {
                    info!("Deployment complete: {}", handle.last_known_url());
                    Ok(handle)
                }
                Err(err) => {
                    warn!("Deployment failed during {:?}: {}", fsm.state(), err);
                    if let Err(e) = fsm.process(DeploymentEvent::Fail(err.kind())) {
                        debug!("{}", e);
                    }
                    if let Err(e) = fsm.process(DeploymentEvent::Reset) {
                        debug!("{}", e);
                    }
                    sink.on_progress(&ProgressEvent::failed(&err));
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        fsm: &mut DeploymentFsm,
        repo: &RepositoryRef,
        content: &DeployableContent,
        sink: &dyn ProgressSink,
        cancel: &CancelSignal,
    ) -> Result<LiveDeploymentHandle, DeployError> {
        let uploading = format!("Uploading {}...", self.settings.file_path);

        self.advance(
            fsm,
            DeploymentEvent::Start,
            sink,
            cancel,
            format!("Checking repository {}...", repo),
        )?;
        match self.call(cancel, self.client.get_repository(repo)).await? {
            RepoLookup::Found(meta) => {
                debug!("Repository {} exists, default branch {:?}", meta.full_name, meta.default_branch);
                self.advance(fsm, DeploymentEvent::RepoFound, sink, cancel, uploading)?;
            }
            RepoLookup::NotFound => {
                self.advance(
                    fsm,
                    DeploymentEvent::RepoMissing,
                    sink,
                    cancel,
                    format!("Creating repository {}...", repo.name),
                )?;
                self.create_repository(repo, cancel).await?;
                self.settle(repo, cancel).await?;
                self.advance(fsm, DeploymentEvent::RepoCreated, sink, cancel, uploading)?;
            }
        }

        let revision = self.upload(repo, content, cancel).await?;

        self.advance(
            fsm,
            DeploymentEvent::ContentUploaded,
            sink,
            cancel,
            "Enabling static hosting...",
        )?;
        let outcome = self
            .call(
                cancel,
                self.client
                    .enable_static_hosting(repo, &self.settings.branch, &self.settings.site_path),
            )
            .await?;
        if outcome == HostingOutcome::AlreadyEnabled {
            info!("Static hosting was already enabled for {}", repo);
        }

        let url = self.live_url(repo);
        self.advance(
            fsm,
            DeploymentEvent::HostingEnabled,
            sink,
            cancel,
            format!("Deployed to {}", url),
        )?;

        Ok(LiveDeploymentHandle::new(
            url,
            repo.clone(),
            content.clone(),
            revision,
        ))
    }

    /// Move the machine and announce the new step.
    /// No step starts after a cancel; finishing a run that already
    /// enabled hosting is not a step.
    fn advance(
        &self,
        fsm: &mut DeploymentFsm,
        event: DeploymentEvent,
        sink: &dyn ProgressSink,
        cancel: &CancelSignal,
        message: impl Into<String>,
    ) -> Result<(), DeployError> {
        if event != DeploymentEvent::HostingEnabled && cancel.is_cancelled() {
            info!("Cancelled before {:?}", event);
            return Err(DeployError::Cancelled);
        }

        let state = fsm.process(event).map_err(DeployError::Internal)?;
        if let Some(step) = state.step() {
            sink.on_progress(&ProgressEvent::step(step, message));
        }
        Ok(())
    }

    /// Run one remote call under the cancel check and the call timeout
    async fn call<T, F>(&self, cancel: &CancelSignal, request: F) -> Result<T, DeployError>
    where
        F: Future<Output = Result<T, HostError>>,
    {
        if cancel.is_cancelled() {
            return Err(DeployError::Cancelled);
        }

        match tokio::time::timeout(self.settings.call_timeout, request).await {
            Ok(result) => result.map_err(DeployError::from),
            Err(_) => Err(DeployError::Transient(format!(
                "remote call timed out after {:?}",
                self.settings.call_timeout
            ))),
        }
    }

    async fn create_repository(
        &self,
        repo: &RepositoryRef,
        cancel: &CancelSignal,
    ) -> Result<(), DeployError> {
        let created = self
            .call(
                cancel,
                self.client
                    .create_repository(&repo.name, &self.settings.create_options),
            )
            .await;

        match created {
            Ok(meta) => {
                info!("Created repository {}", meta.full_name);
                Ok(())
            }
            // Created concurrently elsewhere since the lookup
            Err(DeployError::Conflict(detail)) => {
                info!("Repository {} already exists ({}), continuing", repo, detail);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn settle(&self, repo: &RepositoryRef, cancel: &CancelSignal) -> Result<(), DeployError> {
        match &self.settings.settle {
            SettleStrategy::Fixed(delay) => {
                debug!("Waiting {:?} for {} to settle", delay, repo);
                sleep_or_cancel(*delay, cancel).await
            }
            SettleStrategy::Poll { attempts, backoff } => {
                for attempt in 0..*attempts {
                    match self.call(cancel, self.client.get_repository(repo)).await? {
                        RepoLookup::Found(_) => {
                            debug!("{} visible after {} polls", repo, attempt + 1);
                            return Ok(());
                        }
                        RepoLookup::NotFound => {
                            sleep_or_cancel(backoff.delay(attempt), cancel).await?;
                        }
                    }
                }
                warn!("{} still not visible after {} polls", repo, attempts);
                Ok(())
            }
        }
    }

    /// Write the page, conditioned on the revision just read.
    /// Returns the revision now serving `content`.
    async fn upload(
        &self,
        repo: &RepositoryRef,
        content: &DeployableContent,
        cancel: &CancelSignal,
    ) -> Result<Option<RevisionTag>, DeployError> {
        let path = &self.settings.file_path;

        for attempt in 1..=MAX_PUT_ATTEMPTS {
            let expected = match self.call(cancel, self.client.get_file(repo, path)).await? {
                FileLookup::Found { content: remote, revision } => {
                    if content.same_bytes(&remote) {
                        info!("{} already holds this content at {}", path, revision);
                        return Ok(Some(revision));
                    }
                    Some(revision)
                }
                FileLookup::NotFound => None,
            };

            let written = self
                .call(
                    cancel,
                    self.client
                        .put_file(repo, path, content.bytes(), expected.as_ref()),
                )
                .await?;

            match written {
                PutOutcome::Updated(revision) => {
                    info!("Wrote {} at revision {}", path, revision);
                    return Ok(Some(revision));
                }
                PutOutcome::Conflict => {
                    warn!(
                        "Revision of {} moved during write (attempt {}/{})",
                        path, attempt, MAX_PUT_ATTEMPTS
                    );
                }
            }
        }

        Err(DeployError::Conflict(format!(
            "{} changed during {} write attempts",
            path, MAX_PUT_ATTEMPTS
        )))
    }
}

async fn sleep_or_cancel(delay: Duration, cancel: &CancelSignal) -> Result<(), DeployError> {
    if delay.is_zero() {
        return Ok(());
    }

    let mut cancel = cancel.clone();
    tokio::select! {
        _ = tokio::time::sleep(delay) => Ok(()),
        _ = cancel.cancelled() => Err(DeployError::Cancelled),
    }
}
