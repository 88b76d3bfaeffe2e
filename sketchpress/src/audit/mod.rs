//! Audit engine
//!
//! Asks the generator to review a deployed page against a fixed checklist
//! and turns the schema-shaped answer into a `FindingSet`.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::errors::AuditError;
use crate::generator::markup::extract_code;
use crate::generator::prompts::{audit_prompt, audit_response_schema, audit_system_instruction};
use crate::generator::{GenerationRequest, GenerationTuning, Generator};
use crate::models::{DeployableContent, Finding, FindingSet};

/// What to do with an answer that does not match the findings schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuditPolicy {
    /// Log a warning and report no findings
    #[default]
    FailOpen,

    /// Report `AuditError::MalformedResponse`
    Strict,
}

#[derive(Debug, Deserialize)]
struct AuditAnswer {
    checkpoints: Vec<Finding>,
}

/// Audit engine
pub struct AuditEngine {
    generator: Arc<dyn Generator>,
    policy: AuditPolicy,
    tuning: GenerationTuning,
}

impl AuditEngine {
    pub fn new(generator: Arc<dyn Generator>, policy: AuditPolicy, tuning: GenerationTuning) -> Self {
        Self {
            generator,
            policy,
            tuning,
        }
    }

    pub fn policy(&self) -> AuditPolicy {
        self.policy
    }

    /// Audit `content` as served at `live_url`.
    ///
    /// Generator failures are always returned. Under `FailOpen` an empty set
    /// means either a clean page or an unusable answer; check the log.
    pub async fn audit(
        &self,
        live_url: &str,
        content: &DeployableContent,
    ) -> Result<FindingSet, AuditError> {
        info!("Auditing {}", live_url);

        let request = GenerationRequest {
            system_instruction: audit_system_instruction(live_url),
            prompt: audit_prompt(&content.as_text()),
            temperature: Some(self.tuning.audit_temperature),
            response_schema: Some(audit_response_schema()),
            ..Default::default()
        };
        let answer = self.generator.generate(request).await?;

        match parse_findings(&answer) {
            Ok(findings) => {
                info!(
                    "Audit returned {} checkpoints, {} failing",
                    findings.len(),
                    findings.failing().len()
                );
                Ok(findings)
            }
            Err(reason) => match self.policy {
                AuditPolicy::FailOpen => {
                    warn!("Ignoring audit answer that does not match the schema: {}", reason);
                    Ok(FindingSet::empty())
                }
                AuditPolicy::Strict => Err(AuditError::MalformedResponse(reason)),
            },
        }
    }
}

/// Parse an audit answer. Tolerates the JSON being wrapped in a fenced block.
pub fn parse_findings(answer: &str) -> Result<FindingSet, String> {
    let parsed = serde_json::from_str::<AuditAnswer>(answer.trim()).or_else(|first| {
        let unfenced = extract_code(answer);
        debug!("Audit answer is not bare JSON ({}), trying fenced block", first);
        serde_json::from_str::<AuditAnswer>(&unfenced)
    });

    parsed
        .map(|a| FindingSet::new(a.checkpoints))
        .map_err(|e| e.to_string())
}
