//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use url::Url;

use crate::errors::TransportError;

/// How a request authenticates
#[derive(Clone, Copy)]
pub enum Auth<'a> {
    None,
    /// `Authorization: Bearer <secret>`
    Bearer(&'a SecretString),
    /// Secret sent in a named header
    Header(&'static str, &'a SecretString),
}

/// Status and body of a completed request. Non-2xx answers are returned,
/// not raised, so callers can map them onto their own outcomes.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// HTTP client for one API base URL
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        Self::with_headers(base_url, timeout, user_agent, header::HeaderMap::new())
    }

    /// Create a new HTTP client that sends `headers` on every request
    pub fn with_headers(
        base_url: &str,
        timeout: Duration,
        user_agent: &str,
        headers: header::HeaderMap,
    ) -> Result<Self, TransportError> {
        Url::parse(base_url).map_err(|e| TransportError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request
    pub async fn get(&self, path: &str, auth: Auth<'_>) -> Result<HttpResponse, TransportError> {
        self.send::<()>(Method::GET, path, auth, None).await
    }

    /// Make a POST request
    pub async fn post<B: Serialize>(
        &self,
        path: &str,
        auth: Auth<'_>,
        body: &B,
    ) -> Result<HttpResponse, TransportError> {
        self.send(Method::POST, path, auth, Some(body)).await
    }

    /// Make a PUT request
    pub async fn put<B: Serialize>(
        &self,
        path: &str,
        auth: Auth<'_>,
        body: &B,
    ) -> Result<HttpResponse, TransportError> {
        self.send(Method::PUT, path, auth, Some(body)).await
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        auth: Auth<'_>,
        body: Option<&B>,
    ) -> Result<HttpResponse, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), &url);
        request = match auth {
            Auth::None => request,
            Auth::Bearer(secret) => request.header(
                header::AUTHORIZATION,
                format!("Bearer {}", secret.expose_secret()),
            ),
            Auth::Header(name, secret) => request.header(name, secret.expose_secret()),
        };
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!("{} {} -> {}", method, url, status);
        Ok(HttpResponse { status, body })
    }
}
