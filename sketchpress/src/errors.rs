//! Error types for sketchpress

use thiserror::Error;

/// Failure raised below the host and generator clients
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
}

/// Error returned by a remote resource (host) call
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<TransportError> for HostError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::InvalidBaseUrl(url) => HostError::Rejected {
                status: 0,
                message: format!("invalid base URL {}", url),
            },
            TransportError::Request(e) if e.is_decode() => HostError::Malformed(e.to_string()),
            TransportError::Request(e) => HostError::Transient(e.to_string()),
        }
    }
}

/// Error returned by the generator
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Generator rejected the API key: {0}")]
    Unauthorized(String),

    #[error("Generator unavailable: {0}")]
    Transient(String),

    #[error("Generator rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Generator returned no content")]
    EmptyResponse,

    #[error("Invalid generator input: {0}")]
    InvalidInput(String),
}

impl From<TransportError> for GeneratorError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::InvalidBaseUrl(url) => GeneratorError::Rejected {
                status: 0,
                message: format!("invalid base URL {}", url),
            },
            TransportError::Request(e) => GeneratorError::Transient(e.to_string()),
        }
    }
}

/// Coarse failure classification carried by `DeploymentState::Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unauthorized,
    NotFound,
    Conflict,
    Transient,
    Validation,
    Rejected,
    Cancelled,
    AlreadyInFlight,
    Internal,
}

/// Terminal outcome of a failed deployment run
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Deployment cancelled")]
    Cancelled,

    #[error("Deployment already in flight for {0}")]
    AlreadyInFlight(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeployError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DeployError::Unauthorized(_) => FailureKind::Unauthorized,
            DeployError::NotFound(_) => FailureKind::NotFound,
            DeployError::Conflict(_) => FailureKind::Conflict,
            DeployError::Transient(_) => FailureKind::Transient,
            DeployError::Validation(_) => FailureKind::Validation,
            DeployError::Rejected(_) => FailureKind::Rejected,
            DeployError::Cancelled => FailureKind::Cancelled,
            DeployError::AlreadyInFlight(_) => FailureKind::AlreadyInFlight,
            DeployError::Internal(_) => FailureKind::Internal,
        }
    }

    /// Message safe to show an end user. Transport details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            DeployError::Unauthorized(_) => {
                "The host rejected the access token. Reconnect with a token that has repository permissions.".to_string()
            }
            DeployError::NotFound(_) => {
                "The repository could not be found or created under this account.".to_string()
            }
            DeployError::Conflict(_) => {
                "The site file changed while it was being updated. Deploy again to retry.".to_string()
            }
            DeployError::Transient(_) => {
                "The host is unreachable or did not respond in time. Deploy again to retry.".to_string()
            }
            DeployError::Validation(detail) => format!("Invalid input: {}", detail),
            DeployError::Rejected(_) => "The host rejected the request.".to_string(),
            DeployError::Cancelled => "Deployment cancelled.".to_string(),
            DeployError::AlreadyInFlight(repo) => {
                format!("A deployment to {} is already running.", repo)
            }
            DeployError::Internal(_) => "Deployment stopped on an internal error.".to_string(),
        }
    }
}

impl From<HostError> for DeployError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Unauthorized(msg) => DeployError::Unauthorized(msg),
            HostError::NotFound(msg) => DeployError::NotFound(msg),
            HostError::Conflict(msg) => DeployError::Conflict(msg),
            HostError::Transient(msg) => DeployError::Transient(msg),
            HostError::Rejected { status, message } => {
                DeployError::Rejected(format!("{}: {}", status, message))
            }
            HostError::Malformed(msg) => DeployError::Rejected(format!("malformed response: {}", msg)),
        }
    }
}

/// Error returned by the audit engine
#[derive(Error, Debug)]
pub enum AuditError {
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error("Audit response did not match the findings schema: {0}")]
    MalformedResponse(String),
}

/// Error returned by the repair controller
#[derive(Error, Debug)]
pub enum RepairError {
    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

/// Top-level error for the workbench and the binary
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error(transparent)]
    Repair(#[from] RepairError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No content has been generated yet")]
    NoContent,

    #[error("No valid live deployment; deploy the current content first")]
    NoLiveDeployment,

    #[error("No failing findings to repair; run an audit first")]
    NoFindings,
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl HostError {
    /// Fixed message for end users; the detail stays in the log
    pub fn user_message(&self) -> String {
        match self {
            HostError::Unauthorized(_) => {
                "The host rejected the access token. Reconnect with a token that has repository permissions."
            }
            HostError::NotFound(_) => "The requested resource was not found on the host.",
            HostError::Conflict(_) => "The host reported a conflicting change. Try again.",
            HostError::Transient(_) => "The host is unreachable or did not respond in time. Try again.",
            HostError::Rejected { .. } => "The host rejected the request.",
            HostError::Malformed(_) => "The host sent an unexpected response.",
        }
        .to_string()
    }
}

impl GeneratorError {
    /// Fixed message for end users; the detail stays in the log
    pub fn user_message(&self) -> String {
        match self {
            GeneratorError::Unauthorized(_) => "The generator rejected the API key.".to_string(),
            GeneratorError::Transient(_) => {
                "The generator is unreachable or did not respond in time. Try again.".to_string()
            }
            GeneratorError::Rejected { .. } => "The generator rejected the request.".to_string(),
            GeneratorError::EmptyResponse => "The generator returned no content. Try again.".to_string(),
            GeneratorError::InvalidInput(detail) => format!("Invalid input: {}", detail),
        }
    }
}

impl AuditError {
    pub fn user_message(&self) -> String {
        match self {
            AuditError::Generator(e) => e.user_message(),
            AuditError::MalformedResponse(_) => {
                "The audit answer could not be read. Run the audit again.".to_string()
            }
        }
    }
}

impl RepairError {
    pub fn user_message(&self) -> String {
        match self {
            RepairError::Generator(e) => e.user_message(),
        }
    }
}

impl AppError {
    /// Remote failures get their fixed templates; local errors keep their text
    pub fn user_message(&self) -> String {
        match self {
            AppError::Deploy(e) => e.user_message(),
            AppError::Audit(e) => e.user_message(),
            AppError::Repair(e) => e.user_message(),
            AppError::Generator(e) => e.user_message(),
            AppError::Host(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
