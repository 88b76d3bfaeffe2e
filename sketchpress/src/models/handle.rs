//! Live deployment handle

use chrono::{DateTime, Utc};

use crate::models::content::{DeployableContent, RevisionTag};
use crate::models::repository::RepositoryRef;

/// Result of a completed deployment.
///
/// The URL is only trustworthy while the snapshot is what the host serves.
/// Once the content is repaired or replaced the handle must be invalidated,
/// after which `url()` yields nothing until a new deployment completes.
#[derive(Debug, Clone)]
pub struct LiveDeploymentHandle {
    url: String,
    repository: RepositoryRef,
    snapshot: DeployableContent,
    revision: Option<RevisionTag>,
    deployed_at: DateTime<Utc>,
    stale: bool,
}

impl LiveDeploymentHandle {
    pub fn new(
        url: String,
        repository: RepositoryRef,
        snapshot: DeployableContent,
        revision: Option<RevisionTag>,
    ) -> Self {
        Self {
            url,
            repository,
            snapshot,
            revision,
            deployed_at: Utc::now(),
            stale: false,
        }
    }

    /// Live URL, or `None` once the handle is stale
    pub fn url(&self) -> Option<&str> {
        if self.stale {
            None
        } else {
            Some(&self.url)
        }
    }

    /// Last URL regardless of staleness, for display only
    pub fn last_known_url(&self) -> &str {
        &self.url
    }

    pub fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    pub fn snapshot(&self) -> &DeployableContent {
        &self.snapshot
    }

    /// Remote revision written by the deployment (absent when nothing changed)
    pub fn revision(&self) -> Option<&RevisionTag> {
        self.revision.as_ref()
    }

    pub fn deployed_at(&self) -> DateTime<Utc> {
        self.deployed_at
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Whether the handle is valid and its snapshot is exactly `content`
    pub fn serves(&self, content: &DeployableContent) -> bool {
        !self.stale && self.snapshot.digest() == content.digest()
    }
}
