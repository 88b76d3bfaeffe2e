//! Application configuration options

use std::time::Duration;

use crate::audit::AuditPolicy;
use crate::deploy::orchestrator::{OrchestratorSettings, SettleStrategy};
use crate::generator::GenerationTuning;
use crate::http::gemini::GeneratorOptions;
use crate::http::github::HostOptions;
use crate::storage::settings::Settings;
use crate::utils::PollBackoff;

/// Main application options
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Host API client options
    pub host: HostOptions,

    /// Generator client options
    pub generator: GeneratorOptions,

    /// Deployment orchestrator settings
    pub orchestrator: OrchestratorSettings,

    /// What to do with unusable audit answers
    pub audit_policy: AuditPolicy,

    /// Sampling per generator use
    pub tuning: GenerationTuning,
}

impl From<&Settings> for AppOptions {
    fn from(settings: &Settings) -> Self {
        let deploy = &settings.deploy;

        let settle = match deploy.settle_poll {
            Some(attempts) => SettleStrategy::Poll {
                attempts,
                backoff: PollBackoff::default(),
            },
            None => SettleStrategy::Fixed(Duration::from_millis(deploy.settle_delay_ms)),
        };

        Self {
            host: HostOptions {
                api_base_url: settings.host.api_base_url.clone(),
                user_agent: settings.host.user_agent.clone(),
                request_timeout: Duration::from_secs(settings.host.request_timeout_secs),
                commit_message: deploy.commit_message.clone(),
            },
            generator: GeneratorOptions {
                base_url: settings.generator.base_url.clone(),
                model: settings.generator.model.clone(),
                request_timeout: Duration::from_secs(settings.generator.request_timeout_secs),
            },
            orchestrator: OrchestratorSettings {
                call_timeout: Duration::from_secs(deploy.call_timeout_secs),
                settle,
                branch: deploy.branch.clone(),
                site_path: deploy.site_path.clone(),
                file_path: deploy.file_path.clone(),
                pages_domain: settings.host.pages_domain.clone(),
                ..Default::default()
            },
            audit_policy: if settings.audit.strict {
                AuditPolicy::Strict
            } else {
                AuditPolicy::FailOpen
            },
            tuning: GenerationTuning::default(),
        }
    }
}
