//! Repair cycle controller
//!
//! Feeds failing audit findings back to the generator. The controller holds
//! no deployment state: when it returns `RepairOutcome::Repaired`, the new
//! content has never been deployed and the caller must invalidate its
//! `LiveDeploymentHandle` (see `RepairOutcome::apply_to`).

use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{GeneratorError, RepairError};
use crate::generator::markup::extract_code;
use crate::generator::prompts::{repair_prompt, REPAIR_SYSTEM_INSTRUCTION};
use crate::generator::{GenerationRequest, GenerationTuning, Generator};
use crate::models::{DeployableContent, FailingFinding, LiveDeploymentHandle};

/// Result of a repair call
#[derive(Debug, Clone)]
#[must_use = "a repaired outcome invalidates the live deployment handle"]
pub enum RepairOutcome {
    /// No failing findings; the generator was not called and the input is returned as is
    NothingToRepair(DeployableContent),

    /// Corrected content, not deployed yet
    Repaired(DeployableContent),
}

impl RepairOutcome {
    pub fn content(&self) -> &DeployableContent {
        match self {
            RepairOutcome::NothingToRepair(c) | RepairOutcome::Repaired(c) => c,
        }
    }

    pub fn into_content(self) -> DeployableContent {
        match self {
            RepairOutcome::NothingToRepair(c) | RepairOutcome::Repaired(c) => c,
        }
    }

    pub fn is_repaired(&self) -> bool {
        matches!(self, RepairOutcome::Repaired(_))
    }

    /// Invalidate `handle` if the content changed
    pub fn apply_to(&self, handle: Option<&mut LiveDeploymentHandle>) {
        if let (RepairOutcome::Repaired(_), Some(handle)) = (self, handle) {
            debug!("Invalidating live deployment {}", handle.last_known_url());
            handle.invalidate();
        }
    }
}

/// Render findings the way the generator receives them, one `"label: status"` each
pub fn finding_lines(findings: &[FailingFinding]) -> Vec<String> {
    findings.iter().map(FailingFinding::line).collect()
}

/// Repair cycle controller
pub struct RepairController {
    generator: Arc<dyn Generator>,
    tuning: GenerationTuning,
}

impl RepairController {
    pub fn new(generator: Arc<dyn Generator>, tuning: GenerationTuning) -> Self {
        Self { generator, tuning }
    }

    /// Ask the generator to fix `failing` in `content`, keeping finding order
    pub async fn repair(
        &self,
        content: &DeployableContent,
        failing: &[FailingFinding],
    ) -> Result<RepairOutcome, RepairError> {
        if failing.is_empty() {
            debug!("No failing findings, skipping repair");
            return Ok(RepairOutcome::NothingToRepair(content.clone()));
        }

        let lines = finding_lines(failing);
        info!("Repairing {} findings", lines.len());

        let request = GenerationRequest {
            system_instruction: REPAIR_SYSTEM_INSTRUCTION.to_string(),
            prompt: repair_prompt(&content.as_text(), &lines),
            temperature: Some(self.tuning.repair_temperature),
            ..Default::default()
        };
        let answer = self.generator.generate(request).await?;

        let code = extract_code(&answer);
        if code.is_empty() {
            return Err(GeneratorError::EmptyResponse.into());
        }

        info!("Repair produced {} bytes", code.len());
        Ok(RepairOutcome::Repaired(DeployableContent::from_text(code)))
    }
}
