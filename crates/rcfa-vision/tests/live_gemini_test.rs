//! Live regression test against the Gemini API
//!
//! Skipped unless both variables are set:
//!   GOOGLE_API_KEY=...  RCFA_LIVE_IMAGE=/path/to/bearing.jpg \
//!     cargo test -p rcfa-vision --test live_gemini_test -- --nocapture

use rcfa_types::{AnalysisContext, MotorMounting};
use rcfa_vision::{AnalyzerConfig, BearingAnalyzer, GeminiBackend, ImagePayload};
use std::env;

#[tokio::test]
async fn test_live_analysis_is_well_formed() {
    let (Ok(api_key), Ok(image_path)) = (env::var("GOOGLE_API_KEY"), env::var("RCFA_LIVE_IMAGE")) else {
        eprintln!("GOOGLE_API_KEY / RCFA_LIVE_IMAGE not set, skipping");
        return;
    };

    let bytes = std::fs::read(&image_path).unwrap();
    let payload = ImagePayload::from_bytes(bytes, &image_path).unwrap();
    let backend = GeminiBackend::new(Some(api_key), env::var("GEMINI_MODEL").ok());
    let analyzer = BearingAnalyzer::new(backend, AnalyzerConfig::default().with_timeout_secs(120));
    let ctx = AnalysisContext::default().with_motor_mounting(MotorMounting::Unknown);

    let response = analyzer.analyze(&payload, &ctx).await.unwrap();
    println!("{}", serde_json::to_string_pretty(&response).unwrap());

    let analysis = &response.analysis;
    assert!(!analysis.is_degraded(), "live call degraded: {:?}", analysis.technical_notes);
    assert!((1..=2).contains(&analysis.root_cause_analysis.len()));
    assert!((1..=4).contains(&analysis.recommendations.len()));
}
