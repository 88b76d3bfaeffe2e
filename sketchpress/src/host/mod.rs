//! Remote resource client for the host
//!
//! Each call is one request/response pair. No retries, caching or state
//! live here; sequencing and retry policy belong to the orchestrator.

use async_trait::async_trait;

use crate::errors::HostError;
use crate::models::{CreateRepositoryOptions, RepositoryMeta, RepositoryRef, RevisionTag};

/// Result of a repository lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoLookup {
    Found(RepositoryMeta),
    NotFound,
}

/// Result of a file lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLookup {
    Found { content: Vec<u8>, revision: RevisionTag },
    NotFound,
}

/// Result of a conditional file write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    Updated(RevisionTag),
    /// The expected revision no longer matches the remote file
    Conflict,
}

/// Result of a static-hosting activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostingOutcome {
    Enabled,
    AlreadyEnabled,
}

/// Account owning the credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUser {
    pub login: String,
    pub avatar_url: Option<String>,
}

/// Typed wrapper over the host REST API.
///
/// `401/403`-class answers must surface as `HostError::Unauthorized`.
#[async_trait]
pub trait RemoteResourceClient: Send + Sync {
    async fn get_repository(&self, repo: &RepositoryRef) -> Result<RepoLookup, HostError>;

    /// Create a repository named `name` under the authenticated account.
    /// An already-existing repository is reported as `HostError::Conflict`.
    async fn create_repository(
        &self,
        name: &str,
        options: &CreateRepositoryOptions,
    ) -> Result<RepositoryMeta, HostError>;

    async fn get_file(&self, repo: &RepositoryRef, path: &str) -> Result<FileLookup, HostError>;

    /// Write `content` at `path`. Without `expected` the file must not exist yet.
    async fn put_file(
        &self,
        repo: &RepositoryRef,
        path: &str,
        content: &[u8],
        expected: Option<&RevisionTag>,
    ) -> Result<PutOutcome, HostError>;

    async fn enable_static_hosting(
        &self,
        repo: &RepositoryRef,
        branch: &str,
        path: &str,
    ) -> Result<HostingOutcome, HostError>;

    async fn get_authenticated_user(&self) -> Result<HostUser, HostError>;
}
