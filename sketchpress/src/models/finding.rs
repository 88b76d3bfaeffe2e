//! Audit findings

use serde::{Deserialize, Serialize};

/// One audit checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Short name of the check (e.g. "Semantic HTML5")
    pub label: String,

    /// Human-readable verdict (e.g. "Passed", "Missing labels")
    pub status: String,

    pub passed: bool,
}

impl Finding {
    pub fn new(label: impl Into<String>, status: impl Into<String>, passed: bool) -> Self {
        Self {
            label: label.into(),
            status: status.into(),
            passed,
        }
    }
}

/// Findings produced by exactly one audit call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingSet {
    findings: Vec<Finding>,
}

impl FindingSet {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self { findings }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    /// An empty set is ambiguous: a clean page or an unusable audit response.
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        self.findings.iter().any(|f| !f.passed)
    }

    /// Failing findings, in audit order
    pub fn failing(&self) -> Vec<FailingFinding> {
        self.findings
            .iter()
            .filter(|f| !f.passed)
            .map(|f| FailingFinding {
                label: f.label.clone(),
                status: f.status.clone(),
            })
            .collect()
    }
}

/// Failing finding handed to the repair controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailingFinding {
    pub label: String,
    pub status: String,
}

impl FailingFinding {
    pub fn new(label: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            status: status.into(),
        }
    }

    /// `"{label}: {status}"`
    pub fn line(&self) -> String {
        format!("{}: {}", self.label, self.status)
    }
}
