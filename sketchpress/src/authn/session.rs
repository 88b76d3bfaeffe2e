//! Host session and credential

use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::errors::{AppError, HostError};
use crate::host::RemoteResourceClient;

/// Bearer token for the host account.
///
/// Only the host client reads the raw value, when it builds the
/// `Authorization` header. `Debug` never prints it.
pub struct Credential(SecretString);

impl Credential {
    pub fn new(token: impl Into<String>) -> Result<Self, AppError> {
        let token: String = token.into();
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::ValidationError("access token is empty".to_string()));
        }
        Ok(Self(SecretString::from(token.to_string())))
    }

    pub(crate) fn secret(&self) -> &SecretString {
        &self.0
    }

    /// Whether `text` contains the raw token
    pub fn leaks_into(&self, text: &str) -> bool {
        text.contains(self.0.expose_secret())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([redacted])")
    }
}

/// One user's session: the credential plus when it was supplied.
/// Constructed once and shared (`Arc<Session>`) with every host-facing component.
#[derive(Debug)]
pub struct Session {
    credential: Credential,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            created_at: Utc::now(),
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Check the session's credential against the host and return the account login
pub async fn verify_session(client: &dyn RemoteResourceClient) -> Result<String, HostError> {
    let user = client.get_authenticated_user().await?;
    info!("Connected to host as {}", user.login);
    Ok(user.login)
}
