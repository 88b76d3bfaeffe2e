//! Domain models

pub mod content;
pub mod finding;
pub mod handle;
pub mod repository;

pub use content::{DeployableContent, RevisionTag};
pub use finding::{FailingFinding, Finding, FindingSet};
pub use handle::LiveDeploymentHandle;
pub use repository::{CreateRepositoryOptions, RepositoryMeta, RepositoryRef};
