//! Analysis Service - core use case for bearing image analysis
//!
//! 1. Validate and load the image
//! 2. Render the expert prompt for the caller's context
//! 3. Check the cache (image bytes + prompt)
//! 4. Call the vision model through the analyzer
//! 5. Cache non-degraded results

use crate::config::Config;
use crate::scanner::load_image;
use chrono::Utc;
use rcfa_types::{AnalysisContext, AnalysisResponse, Error};
use rcfa_vision::{build_expert_prompt, BearingAnalyzer, Cache, GeminiBackend, ImagePayload, VisionBackend};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors specific to the analysis service
#[derive(Debug, Error)]
pub enum AnalysisServiceError {
    #[error("Image validation failed: {0}")]
    InvalidImage(String),

    #[error("Analyzer not ready: {0}")]
    NotReady(String),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<Error> for AnalysisServiceError {
    fn from(err: Error) -> Self {
        match err {
            Error::FileNotFound(msg) | Error::InvalidImageFormat(msg) | Error::EmptyImage(msg) => {
                AnalysisServiceError::InvalidImage(msg)
            }
            Error::Image(e) => AnalysisServiceError::InvalidImage(e.to_string()),
            Error::NotReady(msg) => AnalysisServiceError::NotReady(msg),
            Error::AnalysisFailed(msg) => AnalysisServiceError::AnalysisFailed(msg),
            Error::Cache(e) => AnalysisServiceError::CacheError(e.to_string()),
            Error::Config(e) => AnalysisServiceError::ConfigError(e.to_string()),
            _ => AnalysisServiceError::AnalysisFailed(err.to_string()),
        }
    }
}

/// Response plus where it came from
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub response: AnalysisResponse,

    /// Whether result came from cache
    pub from_cache: bool,
}

/// Analyzer with an optional result cache in front of it
pub struct AnalysisService<B: VisionBackend> {
    analyzer: BearingAnalyzer<B>,
    cache: Option<Cache>,
}

impl AnalysisService<GeminiBackend> {
    /// Gemini-backed service. The cache is skipped when disabled or unavailable.
    pub fn from_config(config: &Config, use_cache: bool) -> Self {
        let analyzer = BearingAnalyzer::new(config.backend(), config.analyzer_config());

        let cache = if use_cache && config.cache_enabled {
            config
                .cache_dir()
                .and_then(Cache::new)
                .map_err(|e| warn!(error = %e, "cache unavailable, continuing without it"))
                .ok()
        } else {
            None
        };

        Self::new(analyzer, cache)
    }
}

impl<B: VisionBackend> AnalysisService<B> {
    pub fn new(analyzer: BearingAnalyzer<B>, cache: Option<Cache>) -> Self {
        Self { analyzer, cache }
    }

    pub fn analyzer(&self) -> &BearingAnalyzer<B> {
        &self.analyzer
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Analyze an image file
    pub async fn analyze_path(
        &self,
        image_path: &Path,
        context: &AnalysisContext,
    ) -> Result<AnalysisOutcome, AnalysisServiceError> {
        let payload = load_image(image_path)?;
        self.analyze_payload(&payload, context).await
    }

    /// Analyze image bytes that were already loaded
    pub async fn analyze_payload(
        &self,
        payload: &ImagePayload,
        context: &AnalysisContext,
    ) -> Result<AnalysisOutcome, AnalysisServiceError> {
        let started = Instant::now();
        let prompt = build_expert_prompt(context);
        let cache_key = Cache::cache_key(&payload.bytes, &prompt);

        if let Some(ref cache) = self.cache {
            match cache.get(&cache_key) {
                Ok(Some(analysis)) => {
                    debug!(key = %cache_key, "cache hit");
                    return Ok(AnalysisOutcome {
                        response: AnalysisResponse {
                            analysis,
                            processing_time_secs: started.elapsed().as_secs_f64(),
                            model_used: self.analyzer.model_name().to_string(),
                            timestamp: Utc::now(),
                        },
                        from_cache: true,
                    });
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "ignoring unreadable cache entry"),
            }
        }

        if !self.analyzer.is_ready() {
            return Err(AnalysisServiceError::NotReady(
                "API key not configured. Set GOOGLE_API_KEY or run `bearing-rcfa config --set-api-key`"
                    .to_string(),
            ));
        }

        let response = self.analyzer.analyze_with_prompt(payload, &prompt).await;

        if let Some(ref cache) = self.cache {
            if response.analysis.is_degraded() {
                info!("degraded result not cached");
            } else if let Err(e) = cache.set(&cache_key, &response.analysis) {
                warn!(error = %e, "failed to write cache entry");
            }
        }

        Ok(AnalysisOutcome {
            response,
            from_cache: false,
        })
    }
}
