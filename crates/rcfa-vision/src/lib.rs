//! Vision module - bearing failure analysis with a vision-capable model
//!
//! This crate provides:
//! - The expert prompt, shaped by the caller's analysis context
//! - A tolerant parser that turns the model's sectioned prose into a report
//! - The `VisionBackend` seam and a Gemini implementation
//! - Result caching keyed by image and prompt

pub mod ai;
pub mod cache;
pub mod parser;

// Re-export main types for convenience
pub use ai::backend_impl::GeminiBackend;
pub use ai::prompts::{build_context_block, build_expert_prompt, NO_BEARING_RESPONSE};
pub use ai::{BackendError, ImagePayload, VisionBackend};
pub use cache::{Cache, CacheStats};
pub use parser::{render_sections, ResponseParser};

use chrono::Utc;
use rcfa_types::{AnalysisContext, AnalysisResponse, Error, Result};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Upper bound on one model call
    pub timeout: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}

impl AnalyzerConfig {
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs.max(1));
        self
    }
}

/// Prompt → model → parser pipeline for one backend
pub struct BearingAnalyzer<B: VisionBackend> {
    backend: B,
    parser: ResponseParser,
    config: AnalyzerConfig,
}

impl<B: VisionBackend> BearingAnalyzer<B> {
    pub fn new(backend: B, config: AnalyzerConfig) -> Self {
        Self {
            backend,
            parser: ResponseParser::new(),
            config,
        }
    }

    pub fn with_parser(mut self, parser: ResponseParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.backend.is_ready()
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    pub fn parser(&self) -> &ResponseParser {
        &self.parser
    }

    /// Analyze one image.
    ///
    /// Returns `Err` only when the backend is not configured. A failed or
    /// timed-out model call is reported as a degraded result, not retried.
    pub async fn analyze(
        &self,
        image: &ImagePayload,
        context: &AnalysisContext,
    ) -> Result<AnalysisResponse> {
        if !self.is_ready() {
            return Err(Error::NotReady(
                "API key not configured. Set GOOGLE_API_KEY or run `config --set-api-key`".to_string(),
            ));
        }

        let prompt = build_expert_prompt(context);
        Ok(self.analyze_with_prompt(image, &prompt).await)
    }

    /// Run a pre-rendered prompt; used when the caller already built it (cache keys)
    pub async fn analyze_with_prompt(&self, image: &ImagePayload, prompt: &str) -> AnalysisResponse {
        let started = Instant::now();

        info!(model = %self.model_name(), image_bytes = image.bytes.len(), "starting bearing analysis");

        let outcome = tokio::time::timeout(self.config.timeout, self.backend.generate(prompt, image))
            .await
            .unwrap_or(Err(BackendError::Timeout(self.config.timeout)));

        let analysis = match outcome {
            Ok(text) => self.parser.parse(&text),
            Err(e) => {
                warn!(error = %e, "model call failed");
                parser::fallback::upstream_failure(&e.to_string())
            }
        };

        let elapsed = started.elapsed().as_secs_f64();
        info!(
            confidence = analysis.confidence_score,
            elapsed_secs = elapsed,
            "bearing analysis finished"
        );

        AnalysisResponse {
            analysis,
            processing_time_secs: elapsed,
            model_used: self.model_name().to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rcfa_types::MotorMounting;
    use std::sync::Mutex;

    struct StubBackend {
        reply: std::result::Result<String, u16>,
        delay: Duration,
        ready: bool,
        seen_prompt: Mutex<Option<String>>,
    }

    impl StubBackend {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                delay: Duration::ZERO,
                ready: true,
                seen_prompt: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl VisionBackend for StubBackend {
        async fn generate(
            &self,
            prompt: &str,
            _image: &ImagePayload,
        ) -> std::result::Result<String, BackendError> {
            *self.seen_prompt.lock().unwrap() = Some(prompt.to_string());
            tokio::time::sleep(self.delay).await;
            self.reply.clone().map_err(|status| BackendError::Status {
                status,
                body: "quota exceeded".to_string(),
            })
        }

        fn model_name(&self) -> &str {
            "stub-model"
        }

        fn is_ready(&self) -> bool {
            self.ready
        }
    }

    fn payload() -> ImagePayload {
        ImagePayload {
            bytes: vec![1, 2, 3],
            mime_type: "image/jpeg".to_string(),
        }
    }

    #[tokio::test]
    async fn test_analyze_parses_response() {
        let backend = StubBackend::replying("🔢 4. Confidence Score:\nConfidence: 72%\n");
        let analyzer = BearingAnalyzer::new(backend, AnalyzerConfig::default());
        let ctx = AnalysisContext::default().with_motor_mounting(MotorMounting::NotMounted);

        let response = analyzer.analyze(&payload(), &ctx).await.unwrap();
        assert_eq!(response.analysis.confidence_score, 0.72);
        assert_eq!(response.model_used, "stub-model");

        let prompt = analyzer.backend.seen_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Do NOT consider electrical erosion"));
    }

    #[tokio::test]
    async fn test_analyze_not_ready() {
        let mut backend = StubBackend::replying("");
        backend.ready = false;
        let analyzer = BearingAnalyzer::new(backend, AnalyzerConfig::default());
        let err = analyzer.analyze(&payload(), &AnalysisContext::default()).await.unwrap_err();
        assert!(matches!(err, Error::NotReady(_)));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_degraded() {
        let mut backend = StubBackend::replying("");
        backend.reply = Err(429);
        let analyzer = BearingAnalyzer::new(backend, AnalyzerConfig::default());

        let response = analyzer.analyze(&payload(), &AnalysisContext::default()).await.unwrap();
        assert_eq!(response.analysis.confidence_score, 0.0);
        assert_eq!(response.analysis.observed_damage, "Analysis failed due to technical error");
        assert!(response
            .analysis
            .technical_notes
            .as_deref()
            .unwrap_or_default()
            .contains("429"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_degraded() {
        let mut backend = StubBackend::replying("🔍 1. Observed Damage:\nPitting");
        backend.delay = Duration::from_secs(120);
        let analyzer = BearingAnalyzer::new(backend, AnalyzerConfig::default().with_timeout_secs(5));

        let response = analyzer.analyze(&payload(), &AnalysisContext::default()).await.unwrap();
        assert!(response.analysis.is_degraded());
        assert!(response
            .analysis
            .technical_notes
            .as_deref()
            .unwrap_or_default()
            .contains("timed out"));
    }
}
