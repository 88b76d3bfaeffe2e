//! Deployment progress reporting
//!
//! The orchestrator calls `ProgressSink::on_progress` inline, on the task
//! running the deployment, right before each potentially slow remote call.
//! Sinks must not block and must not call back into the orchestrator.

pub mod render;
pub mod sinks;

use serde::{Deserialize, Serialize};

use crate::errors::DeployError;

/// Step reported to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStep {
    Idle,
    CheckingRepo,
    CreatingRepo,
    UploadingContent,
    EnablingHosting,
    Complete,
}

impl DeployStep {
    pub fn label(&self) -> &'static str {
        match self {
            DeployStep::Idle => "Idle",
            DeployStep::CheckingRepo => "Check repository",
            DeployStep::CreatingRepo => "Create repository",
            DeployStep::UploadingContent => "Upload page",
            DeployStep::EnablingHosting => "Enable hosting",
            DeployStep::Complete => "Complete",
        }
    }
}

/// One progress notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub step: DeployStep,

    /// Human-readable, never carries raw transport errors or secrets
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    pub fn step(step: DeployStep, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
            error: None,
        }
    }

    /// Terminal failure event; the machine is back at `Idle`
    pub fn failed(err: &DeployError) -> Self {
        let message = err.user_message();
        Self {
            step: DeployStep::Idle,
            message: message.clone(),
            error: Some(message),
        }
    }

    /// Last event of a run
    pub fn is_terminal(&self) -> bool {
        self.step == DeployStep::Complete || self.error.is_some()
    }
}

/// Observer of deployment progress
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}
