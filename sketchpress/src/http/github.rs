//! GitHub implementation of the remote resource client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::authn::session::Session;
use crate::errors::HostError;
use crate::host::{FileLookup, HostUser, HostingOutcome, PutOutcome, RemoteResourceClient, RepoLookup};
use crate::http::client::{Auth, HttpClient, HttpResponse};
use crate::models::{CreateRepositoryOptions, RepositoryMeta, RepositoryRef, RevisionTag};

/// Host API options
#[derive(Debug, Clone)]
pub struct HostOptions {
    /// REST API base URL
    pub api_base_url: String,

    /// Sent as `User-Agent`, which the API requires
    pub user_agent: String,

    /// Per-request timeout enforced by the HTTP client
    pub request_timeout: Duration,

    /// Commit message for file writes
    pub commit_message: String,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            user_agent: format!("sketchpress/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: Duration::from_secs(30),
            commit_message: "Deploy from sketchpress".to_string(),
        }
    }
}

/// GitHub REST client bound to one session
pub struct GitHubClient {
    http: HttpClient,
    session: Arc<Session>,
    commit_message: String,
}

impl GitHubClient {
    pub fn new(options: &HostOptions, session: Arc<Session>) -> Result<Self, HostError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));

        let http = HttpClient::with_headers(
            &options.api_base_url,
            options.request_timeout,
            &options.user_agent,
            headers,
        )?;

        Ok(Self {
            http,
            session,
            commit_message: options.commit_message.clone(),
        })
    }

    fn auth(&self) -> Auth<'_> {
        Auth::Bearer(self.session.credential().secret())
    }
}

fn contents_path(repo: &RepositoryRef, path: &str) -> String {
    format!(
        "/repos/{}/{}/contents/{}",
        repo.owner,
        repo.name,
        path.trim_start_matches('/')
    )
}

fn error_message(response: &HttpResponse) -> String {
    response
        .json::<host_api::ErrorResponse>()
        .map(|e| e.message)
        .unwrap_or_else(|_| {
            response
                .status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        })
}

/// Map a non-success answer onto the host error taxonomy
fn classify(response: &HttpResponse) -> HostError {
    let message = error_message(response);
    match response.status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => HostError::Unauthorized(message),
        StatusCode::NOT_FOUND => HostError::NotFound(message),
        StatusCode::CONFLICT => HostError::Conflict(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => HostError::Transient(message),
        status if status.is_server_error() => HostError::Transient(format!("{}: {}", status, message)),
        status => HostError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

fn parse<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T, HostError> {
    response
        .json()
        .map_err(|e| HostError::Malformed(e.to_string()))
}

#[async_trait]
impl RemoteResourceClient for GitHubClient {
    async fn get_repository(&self, repo: &RepositoryRef) -> Result<RepoLookup, HostError> {
        let path = format!("/repos/{}/{}", repo.owner, repo.name);
        let response = self.http.get(&path, self.auth()).await?;

        match response.status {
            status if status.is_success() => {
                let repository: host_api::Repository = parse(&response)?;
                Ok(RepoLookup::Found(repository.into()))
            }
            StatusCode::NOT_FOUND => Ok(RepoLookup::NotFound),
            _ => Err(classify(&response)),
        }
    }

    async fn create_repository(
        &self,
        name: &str,
        options: &CreateRepositoryOptions,
    ) -> Result<RepositoryMeta, HostError> {
        let body = host_api::CreateRepositoryRequest {
            name: name.to_string(),
            auto_init: options.auto_init,
            description: options.description.clone(),
            private: options.private,
        };
        let response = self.http.post("/user/repos", self.auth(), &body).await?;

        match response.status {
            status if status.is_success() => {
                let repository: host_api::Repository = parse(&response)?;
                Ok(repository.into())
            }
            // "name already exists on this account"
            StatusCode::UNPROCESSABLE_ENTITY => Err(HostError::Conflict(error_message(&response))),
            _ => Err(classify(&response)),
        }
    }

    async fn get_file(&self, repo: &RepositoryRef, path: &str) -> Result<FileLookup, HostError> {
        let response = self.http.get(&contents_path(repo, path), self.auth()).await?;

        match response.status {
            status if status.is_success() => {
                let file: host_api::ContentFile = parse(&response)?;
                let encoded: String = file
                    .content
                    .unwrap_or_default()
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                let content = BASE64
                    .decode(encoded.as_bytes())
                    .map_err(|e| HostError::Malformed(format!("file content is not base64: {}", e)))?;
                Ok(FileLookup::Found {
                    content,
                    revision: RevisionTag(file.sha),
                })
            }
            StatusCode::NOT_FOUND => Ok(FileLookup::NotFound),
            _ => Err(classify(&response)),
        }
    }

    async fn put_file(
        &self,
        repo: &RepositoryRef,
        path: &str,
        content: &[u8],
        expected: Option<&RevisionTag>,
    ) -> Result<PutOutcome, HostError> {
        let body = host_api::PutContentRequest {
            message: self.commit_message.clone(),
            content: BASE64.encode(content),
            sha: expected.map(|r| r.0.clone()),
            branch: None,
        };
        let response = self.http.put(&contents_path(repo, path), self.auth(), &body).await?;

        match response.status {
            status if status.is_success() => {
                let written: host_api::PutContentResponse = parse(&response)?;
                Ok(PutOutcome::Updated(RevisionTag(written.content.sha)))
            }
            // 409: sha does not match. 422: sha missing for a file that now exists.
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                debug!("File write conflict on {}/{}: {}", repo, path, error_message(&response));
                Ok(PutOutcome::Conflict)
            }
            _ => Err(classify(&response)),
        }
    }

    async fn enable_static_hosting(
        &self,
        repo: &RepositoryRef,
        branch: &str,
        path: &str,
    ) -> Result<HostingOutcome, HostError> {
        let pages_path = format!("/repos/{}/{}/pages", repo.owner, repo.name);
        let body = host_api::EnablePagesRequest {
            source: host_api::PagesSource {
                branch: branch.to_string(),
                path: path.to_string(),
            },
        };
        let response = self.http.post(&pages_path, self.auth(), &body).await?;

        match response.status {
            status if status.is_success() => Ok(HostingOutcome::Enabled),
            StatusCode::CONFLICT => Ok(HostingOutcome::AlreadyEnabled),
            _ => {
                // Activation is not reliably re-callable; a site that already
                // exists counts as enabled.
                warn!(
                    "Pages activation for {} answered {}, checking existing site",
                    repo, response.status
                );
                let existing = self.http.get(&pages_path, self.auth()).await?;
                if existing.is_success() {
                    Ok(HostingOutcome::AlreadyEnabled)
                } else {
                    Err(classify(&response))
                }
            }
        }
    }

    async fn get_authenticated_user(&self) -> Result<HostUser, HostError> {
        let response = self.http.get("/user", self.auth()).await?;
        if !response.is_success() {
            return Err(classify(&response));
        }
        let user: host_api::User = parse(&response)?;
        Ok(HostUser {
            login: user.login,
            avatar_url: user.avatar_url,
        })
    }
}
