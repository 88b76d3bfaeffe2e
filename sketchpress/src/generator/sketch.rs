//! Sketch to markup generation

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::info;

use crate::errors::GeneratorError;
use crate::generator::markup::extract_code;
use crate::generator::prompts::{SKETCH_PROMPT, SKETCH_SYSTEM_INSTRUCTION};
use crate::generator::{GenerationRequest, GenerationTuning, Generator, MediaAttachment};
use crate::models::DeployableContent;

const DEFAULT_MIME: &str = "image/png";

/// Uploaded sketch image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SketchImage {
    pub mime_type: String,
    pub data_base64: String,
}

impl SketchImage {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data_base64: BASE64.encode(bytes),
        }
    }

    /// Accept either a `data:<mime>;base64,<data>` URL or bare base64
    pub fn from_data_url(data: &str) -> Result<Self, GeneratorError> {
        let data = data.trim();
        let (mime_type, payload) = match data.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',').ok_or_else(|| {
                    GeneratorError::InvalidInput("data URL has no ',' separator".to_string())
                })?;
                let mime = header.split(';').next().filter(|m| !m.is_empty()).unwrap_or(DEFAULT_MIME);
                (mime.to_string(), payload)
            }
            None => (DEFAULT_MIME.to_string(), data),
        };

        if payload.is_empty() {
            return Err(GeneratorError::InvalidInput("sketch image is empty".to_string()));
        }

        Ok(Self {
            mime_type,
            data_base64: payload.to_string(),
        })
    }
}

/// Guess an image mime type from a file extension
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => DEFAULT_MIME,
    }
}

/// Turn a sketch into a deployable HTML page
pub async fn generate_markup(
    generator: &dyn Generator,
    image: &SketchImage,
    tuning: &GenerationTuning,
) -> Result<DeployableContent, GeneratorError> {
    let request = GenerationRequest {
        system_instruction: SKETCH_SYSTEM_INSTRUCTION.to_string(),
        prompt: SKETCH_PROMPT.to_string(),
        attachments: vec![MediaAttachment {
            mime_type: image.mime_type.clone(),
            data_base64: image.data_base64.clone(),
        }],
        temperature: Some(tuning.sketch_temperature),
        top_p: Some(tuning.sketch_top_p),
        top_k: Some(tuning.sketch_top_k),
        response_schema: None,
    };

    let answer = generator.generate(request).await?;
    let code = extract_code(&answer);
    if code.is_empty() {
        return Err(GeneratorError::EmptyResponse);
    }

    info!("Generated {} bytes of markup from sketch", code.len());
    Ok(DeployableContent::from_text(code))
}
