//! Step-list rendering for progress displays

use crate::progress::DeployStep;

/// Steps shown by a progress display, in order
pub const DISPLAY_STEPS: [DeployStep; 3] = [
    DeployStep::CheckingRepo,
    DeployStep::UploadingContent,
    DeployStep::EnablingHosting,
];

/// Display state of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Done,
    Active,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRender {
    pub step: DeployStep,
    /// 1-based position in the list
    pub position: usize,
    pub label: &'static str,
    pub status: StepStatus,
}

/// Position of a step along the deployment order
fn ordinal(step: DeployStep) -> usize {
    match step {
        DeployStep::Idle => 0,
        // Repository creation belongs to the repository phase
        DeployStep::CheckingRepo | DeployStep::CreatingRepo => 1,
        DeployStep::UploadingContent => 2,
        DeployStep::EnablingHosting => 3,
        DeployStep::Complete => 4,
    }
}

/// Derive done/active/pending for every listed step from the current one
pub fn render_steps(current: DeployStep, steps: &[DeployStep]) -> Vec<StepRender> {
    let now = ordinal(current);
    steps
        .iter()
        .enumerate()
        .map(|(i, &step)| {
            let at = ordinal(step);
            let status = if current == DeployStep::Idle {
                StepStatus::Pending
            } else if at < now {
                StepStatus::Done
            } else if at == now {
                StepStatus::Active
            } else {
                StepStatus::Pending
            };
            StepRender {
                step,
                position: i + 1,
                label: step.label(),
                status,
            }
        })
        .collect()
}
