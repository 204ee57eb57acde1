//! Model-facing side: prompts and the vision backend seam

pub mod backend_impl;
pub mod prompts;

use async_trait::async_trait;
use rcfa_types::{Error, Result};
use std::time::Duration;
use thiserror::Error as ThisError;

/// Errors from a single model call
#[derive(Debug, ThisError)]
pub enum BackendError {
    #[error("API key not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response blocked: {0}")]
    Blocked(String),

    #[error("model returned no text")]
    EmptyResponse,

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
}

/// Image bytes plus the MIME type sent alongside them
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImagePayload {
    /// Detect the format from the bytes. Empty or unrecognised data is rejected.
    pub fn from_bytes(bytes: Vec<u8>, source: &str) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::EmptyImage(source.to_string()));
        }

        let format = image::guess_format(&bytes)
            .map_err(|e| Error::InvalidImageFormat(format!("{}: {}", source, e)))?;

        Ok(Self {
            mime_type: format.to_mime_type().to_string(),
            bytes,
        })
    }
}

/// A vision-capable generative model: prompt + image in, prose out
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Run one generation. No retries are attempted.
    async fn generate(&self, prompt: &str, image: &ImagePayload) -> std::result::Result<String, BackendError>;

    /// Model identifier reported to callers
    fn model_name(&self) -> &str;

    /// Whether the backend has what it needs to make calls
    fn is_ready(&self) -> bool;
}
