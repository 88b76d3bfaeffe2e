//! Repository identifiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DeployError;

/// Repository name used when the user has not picked one
pub const DEFAULT_REPOSITORY_NAME: &str = "sketchpress-site";

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

/// Target repository, parsed from `"owner/name"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    /// Parse `"owner/name"`. Both parts must be non-empty and use only
    /// the host's name characters, so they can go into a URL path as is.
    pub fn parse(path: &str) -> Result<Self, DeployError> {
        let path = path.trim();
        let (owner, name) = path.split_once('/').ok_or_else(|| {
            DeployError::Validation(format!("repository must be \"owner/name\", got \"{}\"", path))
        })?;

        if owner.is_empty() || name.is_empty() {
            return Err(DeployError::Validation(format!(
                "repository owner and name must both be non-empty, got \"{}\"",
                path
            )));
        }
        if name.contains('/') {
            return Err(DeployError::Validation(format!(
                "repository path has more than one '/': \"{}\"",
                path
            )));
        }
        for part in [owner, name] {
            if part == "." || part == ".." {
                return Err(DeployError::Validation(format!(
                    "\"{}\" is not a valid repository owner or name",
                    part
                )));
            }
            if let Some(c) = part.chars().find(|c| !is_name_char(*c)) {
                return Err(DeployError::Validation(format!(
                    "repository path contains {:?}; only letters, digits, '.', '-' and '_' are allowed: \"{}\"",
                    c, path
                )));
            }
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Default repository for an account
    pub fn default_for(login: &str) -> Self {
        Self {
            owner: login.to_string(),
            name: DEFAULT_REPOSITORY_NAME.to_string(),
        }
    }

    /// Static-site URL. Pure derivation, no round trip.
    pub fn pages_url(&self, pages_domain: &str) -> String {
        format!("https://{}.{}/{}/", self.owner, pages_domain, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryRef {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Metadata the host returns for an existing repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryMeta {
    pub full_name: String,
    pub default_branch: Option<String>,
    pub private: bool,
}

impl From<host_api::Repository> for RepositoryMeta {
    fn from(repo: host_api::Repository) -> Self {
        Self {
            full_name: repo.full_name,
            default_branch: repo.default_branch,
            private: repo.private,
        }
    }
}

/// Options sent when a repository has to be created
#[derive(Debug, Clone)]
pub struct CreateRepositoryOptions {
    /// Create an initial commit so the default branch exists
    pub auto_init: bool,
    pub private: bool,
    pub description: Option<String>,
}

impl Default for CreateRepositoryOptions {
    fn default() -> Self {
        Self {
            auto_init: true,
            private: false,
            description: Some("Site generated by sketchpress".to_string()),
        }
    }
}
