//! Generator port
//!
//! The generative service is an opaque function: a system instruction, a
//! prompt and optional media go in, free text (or schema-shaped JSON text)
//! comes out. Sketch generation, audit and repair all build on this one call.

pub mod markup;
pub mod prompts;
pub mod sketch;

use async_trait::async_trait;

use crate::errors::GeneratorError;

/// Base64 media attached to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub mime_type: String,
    pub data_base64: String,
}

/// One generation call
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub attachments: Vec<MediaAttachment>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    /// When set the generator must answer with JSON following this schema
    pub response_schema: Option<serde_json::Value>,
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Run one generation and return the raw text answer
    async fn generate(&self, request: GenerationRequest) -> Result<String, GeneratorError>;
}

/// Sampling settings per generator use
#[derive(Debug, Clone)]
pub struct GenerationTuning {
    pub sketch_temperature: f32,
    pub sketch_top_p: f32,
    pub sketch_top_k: u32,
    pub audit_temperature: f32,
    pub repair_temperature: f32,
}

impl Default for GenerationTuning {
    fn default() -> Self {
        Self {
            sketch_temperature: 0.2,
            sketch_top_p: 0.95,
            sketch_top_k: 40,
            audit_temperature: 0.2,
            repair_temperature: 0.1,
        }
    }
}
