//! Finite State Machine for one deployment run

use serde::{Deserialize, Serialize};

use crate::errors::FailureKind;
use crate::progress::DeployStep;

/// Deployment state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    /// No run in progress
    Idle,

    /// Looking up the target repository
    CheckingRepo,

    /// Creating the missing repository
    CreatingRepo,

    /// Writing the page file
    UploadingContent,

    /// Turning on static hosting
    EnablingHosting,

    /// Live
    Complete,

    /// Run ended with an error
    Failed(FailureKind),
}

impl DeploymentState {
    /// Step reported to progress sinks, `None` for `Failed`
    pub fn step(&self) -> Option<DeployStep> {
        match self {
            DeploymentState::Idle => Some(DeployStep::Idle),
            DeploymentState::CheckingRepo => Some(DeployStep::CheckingRepo),
            DeploymentState::CreatingRepo => Some(DeployStep::CreatingRepo),
            DeploymentState::UploadingContent => Some(DeployStep::UploadingContent),
            DeploymentState::EnablingHosting => Some(DeployStep::EnablingHosting),
            DeploymentState::Complete => Some(DeployStep::Complete),
            DeploymentState::Failed(_) => None,
        }
    }

    /// Whether a remote step is underway
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            DeploymentState::CheckingRepo
                | DeploymentState::CreatingRepo
                | DeploymentState::UploadingContent
                | DeploymentState::EnablingHosting
        )
    }
}

/// Deployment event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentEvent {
    /// Begin a run
    Start,

    /// Repository exists
    RepoFound,

    /// Repository does not exist
    RepoMissing,

    /// Repository created and settled
    RepoCreated,

    /// Page written (or already current)
    ContentUploaded,

    /// Hosting on
    HostingEnabled,

    /// Any step failed
    Fail(FailureKind),

    /// Back to idle after a finished run
    Reset,
}

/// Deployment FSM
#[derive(Debug, Clone)]
pub struct DeploymentFsm {
    state: DeploymentState,
    history: Vec<DeploymentState>,
}

impl DeploymentFsm {
    /// Create a new FSM in idle state
    pub fn new() -> Self {
        Self {
            state: DeploymentState::Idle,
            history: vec![DeploymentState::Idle],
        }
    }

    /// Get current state
    pub fn state(&self) -> DeploymentState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`
    pub fn history(&self) -> &[DeploymentState] {
        &self.history
    }

    /// Failure of the last run, if it failed
    pub fn failure(&self) -> Option<FailureKind> {
        self.history.iter().rev().find_map(|s| match s {
            DeploymentState::Failed(kind) => Some(*kind),
            _ => None,
        })
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: DeploymentEvent) -> Result<DeploymentState, String> {
        use DeploymentEvent as E;
        use DeploymentState as S;

        let new_state = match (self.state, event) {
            (S::Idle, E::Start) => S::CheckingRepo,

            (S::CheckingRepo, E::RepoFound) => S::UploadingContent,
            (S::CheckingRepo, E::RepoMissing) => S::CreatingRepo,

            (S::CreatingRepo, E::RepoCreated) => S::UploadingContent,

            (S::UploadingContent, E::ContentUploaded) => S::EnablingHosting,

            (S::EnablingHosting, E::HostingEnabled) => S::Complete,

            // Rejections before the first step fail straight from Idle
            (state, E::Fail(kind)) if state.is_active() || state == S::Idle => S::Failed(kind),

            (S::Complete, E::Reset) | (S::Failed(_), E::Reset) => S::Idle,

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        self.history.push(new_state);
        Ok(new_state)
    }
}

impl Default for DeploymentFsm {
    fn default() -> Self {
        Self::new()
    }
}
