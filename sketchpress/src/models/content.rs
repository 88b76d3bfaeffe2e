//! Deployable content snapshots

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

/// Immutable generated page. Clones share the same bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct DeployableContent {
    bytes: Arc<[u8]>,
    digest: String,
}

impl DeployableContent {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        let digest = format!("{:x}", Sha256::digest(&bytes));
        Self {
            bytes: bytes.into(),
            digest,
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(text.into().into_bytes())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// SHA-256 hex digest of the bytes
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Whether `other` carries exactly these bytes
    pub fn same_bytes(&self, other: &[u8]) -> bool {
        self.bytes.as_ref() == other
    }
}

impl fmt::Debug for DeployableContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployableContent")
            .field("len", &self.bytes.len())
            .field("digest", &self.digest)
            .finish()
    }
}

/// Opaque version marker of a remote file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevisionTag(pub String);

impl RevisionTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
