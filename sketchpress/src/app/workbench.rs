//! One user's working session
//!
//! Holds the current page, the live deployment serving it and the findings
//! of the last audit. Every action takes `&mut self`, so a session runs one
//! action at a time.

use std::sync::Arc;

use tracing::{info, warn};

use crate::app::options::AppOptions;
use crate::audit::AuditEngine;
use crate::deploy::cancel::CancelSignal;
use crate::deploy::orchestrator::Orchestrator;
use crate::errors::AppError;
use crate::generator::sketch::{generate_markup, SketchImage};
use crate::generator::{GenerationTuning, Generator};
use crate::host::RemoteResourceClient;
use crate::models::{
    DeployableContent, FailingFinding, FindingSet, LiveDeploymentHandle, RepositoryRef,
};
use crate::progress::ProgressSink;
use crate::repair::{RepairController, RepairOutcome};

/// Outcome of `Workbench::cycle`
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Audit rounds run
    pub rounds: u32,

    /// URL serving the final content
    pub url: String,

    /// Failures reported by the last audit
    pub remaining: Vec<FailingFinding>,
}

pub struct Workbench {
    generator: Arc<dyn Generator>,
    orchestrator: Orchestrator,
    auditor: AuditEngine,
    repairer: RepairController,
    tuning: GenerationTuning,

    content: Option<DeployableContent>,
    live: Option<LiveDeploymentHandle>,
    last_findings: Option<FindingSet>,
}

impl Workbench {
    pub fn new(
        client: Arc<dyn RemoteResourceClient>,
        generator: Arc<dyn Generator>,
        options: &AppOptions,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(client, options.orchestrator.clone()),
            auditor: AuditEngine::new(generator.clone(), options.audit_policy, options.tuning.clone()),
            repairer: RepairController::new(generator.clone(), options.tuning.clone()),
            generator,
            tuning: options.tuning.clone(),
            content: None,
            live: None,
            last_findings: None,
        }
    }

    pub fn content(&self) -> Option<&DeployableContent> {
        self.content.as_ref()
    }

    /// Last deployment, possibly stale
    pub fn live(&self) -> Option<&LiveDeploymentHandle> {
        self.live.as_ref()
    }

    /// URL serving the current content, if any
    pub fn live_url(&self) -> Option<&str> {
        self.live.as_ref().and_then(|h| h.url())
    }

    pub fn last_findings(&self) -> Option<&FindingSet> {
        self.last_findings.as_ref()
    }

    /// Generate a page from a sketch and make it the current content
    pub async fn generate_from_sketch(
        &mut self,
        image: &SketchImage,
    ) -> Result<&DeployableContent, AppError> {
        let content = generate_markup(self.generator.as_ref(), image, &self.tuning).await?;
        Ok(self.replace_content(content))
    }

    /// Make `content` current. A different page invalidates the live deployment.
    pub fn set_content(&mut self, content: DeployableContent) -> &DeployableContent {
        self.replace_content(content)
    }

    fn replace_content(&mut self, content: DeployableContent) -> &DeployableContent {
        if let Some(live) = self.live.as_mut() {
            if !live.serves(&content) && !live.is_stale() {
                info!("Content changed, {} no longer reflects it", live.last_known_url());
                live.invalidate();
            }
        }
        self.last_findings = None;
        self.content.insert(content)
    }

    /// Deploy the current content
    pub async fn deploy(
        &mut self,
        repo: &RepositoryRef,
        sink: &dyn ProgressSink,
        cancel: &CancelSignal,
    ) -> Result<&LiveDeploymentHandle, AppError> {
        let content = self.content.as_ref().ok_or(AppError::NoContent)?;
        let handle = self.orchestrator.deploy(repo, content, sink, cancel).await?;
        Ok(self.live.insert(handle))
    }

    /// Audit the live deployment of the current content
    pub async fn audit(&mut self) -> Result<&FindingSet, AppError> {
        let content = self.content.as_ref().ok_or(AppError::NoContent)?;
        let url = match self.live.as_ref() {
            Some(live) if live.serves(content) => live.url().ok_or(AppError::NoLiveDeployment)?,
            _ => return Err(AppError::NoLiveDeployment),
        };

        let findings = self.auditor.audit(url, content).await?;
        if findings.is_empty() {
            warn!("Audit reported no checkpoints");
        }
        Ok(self.last_findings.insert(findings))
    }

    /// Repair the failures of the last audit
    pub async fn repair(&mut self) -> Result<RepairOutcome, AppError> {
        let failing = self
            .last_findings
            .as_ref()
            .ok_or(AppError::NoFindings)?
            .failing();
        self.repair_with(&failing).await
    }

    /// Repair explicit failures. A repaired page becomes the current content
    /// and the live deployment is invalidated.
    pub async fn repair_with(
        &mut self,
        failing: &[FailingFinding],
    ) -> Result<RepairOutcome, AppError> {
        let content = self.content.as_ref().ok_or(AppError::NoContent)?;
        let outcome = self.repairer.repair(content, failing).await?;

        if outcome.is_repaired() {
            outcome.apply_to(self.live.as_mut());
            self.content = Some(outcome.content().clone());
            self.last_findings = None;
        }
        Ok(outcome)
    }

    /// Deploy, then audit and repair until the audit passes or `rounds` run out.
    /// Every repair is redeployed, so the report's URL serves the final content.
    pub async fn cycle(
        &mut self,
        repo: &RepositoryRef,
        rounds: u32,
        sink: &dyn ProgressSink,
        cancel: &CancelSignal,
    ) -> Result<CycleReport, AppError> {
        self.deploy(repo, sink, cancel).await?;

        let mut round = 0;
        let mut remaining = Vec::new();
        while round < rounds.max(1) {
            round += 1;
            remaining = self.audit().await?.failing();
            info!("Audit round {}: {} failing", round, remaining.len());
            if remaining.is_empty() || round == rounds.max(1) {
                break;
            }

            let outcome = self.repair_with(&remaining).await?;
            if !outcome.is_repaired() {
                break;
            }
            self.deploy(repo, sink, cancel).await?;
        }

        let url = self
            .live_url()
            .ok_or(AppError::NoLiveDeployment)?
            .to_string();
        Ok(CycleReport {
            rounds: round,
            url,
            remaining,
        })
    }
}
