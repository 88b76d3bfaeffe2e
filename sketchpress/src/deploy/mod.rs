//! Deployment module

pub mod cancel;
pub mod fsm;
pub mod guard;
pub mod orchestrator;

pub use cancel::{CancelHandle, CancelSignal};
pub use fsm::{DeploymentEvent, DeploymentFsm, DeploymentState};
pub use orchestrator::{Orchestrator, OrchestratorSettings, SettleStrategy};
