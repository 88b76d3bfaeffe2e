//! Gemini implementation of the generator port

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::SecretString;
use tracing::debug;

use crate::errors::GeneratorError;
use crate::generator::{GenerationRequest, Generator};
use crate::http::client::{Auth, HttpClient, HttpResponse};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Generator API options
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub base_url: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    http: HttpClient,
    api_key: SecretString,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.http.base_url())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(options: &GeneratorOptions, api_key: SecretString) -> Result<Self, GeneratorError> {
        let user_agent = format!("sketchpress/{}", env!("CARGO_PKG_VERSION"));
        let http = HttpClient::new(&options.base_url, options.request_timeout, &user_agent)?;
        Ok(Self {
            http,
            api_key,
            model: options.model.clone(),
        })
    }
}

/// Translate a port request into the wire request
pub fn to_wire(request: &GenerationRequest) -> generator_api::GenerateContentRequest {
    let mut parts = vec![generator_api::Part::text(request.prompt.clone())];
    parts.extend(
        request
            .attachments
            .iter()
            .map(|a| generator_api::Part::inline(a.mime_type.clone(), a.data_base64.clone())),
    );

    let generation_config = generator_api::GenerationConfig {
        temperature: request.temperature,
        top_p: request.top_p,
        top_k: request.top_k,
        response_mime_type: request
            .response_schema
            .as_ref()
            .map(|_| "application/json".to_string()),
        response_schema: request.response_schema.clone(),
    };

    generator_api::GenerateContentRequest {
        contents: vec![generator_api::Content {
            role: Some("user".to_string()),
            parts,
        }],
        system_instruction: (!request.system_instruction.is_empty())
            .then(|| generator_api::Content::text(request.system_instruction.clone())),
        generation_config: Some(generation_config),
    }
}

fn classify(response: &HttpResponse) -> GeneratorError {
    let message = response
        .json::<generator_api::ErrorResponse>()
        .map(|e| e.error.message)
        .unwrap_or_else(|_| response.status.to_string());
    match response.status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GeneratorError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => GeneratorError::Transient(message),
        status if status.is_server_error() => GeneratorError::Transient(message),
        status => GeneratorError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GeneratorError> {
        let path = format!("/v1beta/models/{}:generateContent", self.model);
        let body = to_wire(&request);

        let response = self
            .http
            .post(&path, Auth::Header(API_KEY_HEADER, &self.api_key), &body)
            .await?;
        if !response.is_success() {
            return Err(classify(&response));
        }

        let parsed: generator_api::GenerateContentResponse = response
            .json()
            .map_err(|e| GeneratorError::Rejected {
                status: response.status.as_u16(),
                message: format!("unreadable response: {}", e),
            })?;
        let text = parsed.text();
        debug!("Generator answered with {} characters", text.len());
        Ok(text)
    }
}
