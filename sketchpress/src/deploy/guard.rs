//! Single-flight registry: at most one run per repository

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::models::RepositoryRef;

/// Repositories with a run in flight, keyed case-insensitively like the host
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    active: Mutex<HashSet<String>>,
}

fn registry_key(repo: &RepositoryRef) -> String {
    repo.to_string().to_ascii_lowercase()
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `repo`, or `None` if another run holds it
    pub fn try_acquire(self: &Arc<Self>, repo: &RepositoryRef) -> Option<InFlightGuard> {
        let key = registry_key(repo);
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            registry: Arc::clone(self),
            key,
        })
    }

    pub fn is_active(&self, repo: &RepositoryRef) -> bool {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active.contains(&registry_key(repo))
    }
}

/// Releases the claim when dropped, including on early return or panic
#[derive(Debug)]
pub struct InFlightGuard {
    registry: Arc<InFlightRegistry>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut active = self.registry.active.lock().unwrap_or_else(|e| e.into_inner());
        active.remove(&self.key);
    }
}
