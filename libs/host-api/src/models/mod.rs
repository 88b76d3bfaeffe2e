//! API models

use serde::{Deserialize, Serialize};

/// Repository metadata returned by `GET /repos/{owner}/{repo}` and `POST /user/repos`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Repository creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRepositoryRequest {
    pub name: String,
    pub auto_init: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
}

/// File returned by `GET /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentFile {
    pub sha: String,
    pub path: String,
    /// Base64 with embedded line breaks
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

/// File upsert request for `PUT /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutContentRequest {
    pub message: String,
    /// Base64-encoded file bytes
    pub content: String,
    /// Blob SHA of the file being replaced; omitted when creating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// File upsert response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutContentResponse {
    pub content: ContentSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSummary {
    pub sha: String,
    pub path: String,
}

/// Pages source branch and folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesSource {
    pub branch: String,
    pub path: String,
}

/// Pages activation request for `POST /repos/{owner}/{repo}/pages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnablePagesRequest {
    pub source: PagesSource,
}

/// Pages site info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesSite {
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub source: Option<PagesSource>,
}

/// Authenticated user returned by `GET /user`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default)]
    pub documentation_url: Option<String>,
}
