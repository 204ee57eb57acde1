//! Fixed fallback values and degraded results

use rcfa_types::AnalysisResult;

pub const NO_DAMAGE_FALLBACK: &str = "No visible damage detected";
pub const NO_FAILURE_MODE_FALLBACK: &str = "Unable to determine failure mode";
pub const NO_ROOT_CAUSE_FALLBACK: &str = "Insufficient visual evidence";

/// Degraded result when the response text could not be scanned
pub fn parse_failure(description: &str) -> AnalysisResult {
    AnalysisResult {
        observed_damage: "Error parsing analysis results".to_string(),
        failure_mode: "Analysis failed".to_string(),
        root_cause_analysis: vec!["Technical error in analysis".to_string()],
        confidence_score: 0.0,
        technical_notes: Some(format!("Parsing error: {}", description)),
        recommendations: vec![
            "Check system configuration".to_string(),
            "Verify API key and model access".to_string(),
            "Review image quality and format".to_string(),
        ],
        bearing_detected: true,
    }
}

/// Degraded result when the model call itself failed or timed out
pub fn upstream_failure(description: &str) -> AnalysisResult {
    AnalysisResult {
        observed_damage: "Analysis failed due to technical error".to_string(),
        failure_mode: "Unable to determine".to_string(),
        root_cause_analysis: vec!["Technical error occurred during analysis".to_string()],
        confidence_score: 0.0,
        technical_notes: Some(format!("Error: {}", description)),
        recommendations: vec![
            "Check system connectivity".to_string(),
            "Verify image format and size".to_string(),
            "Check API key validity and quota".to_string(),
        ],
        bearing_detected: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::policy::RECOMMENDATION_DISPLAY_LEN;
    use crate::parser::recommendations::within_length_bounds;
    use crate::parser::text::char_len;

    #[test]
    fn test_degraded_recommendations_fit_display_length() {
        for result in [parse_failure("bad"), upstream_failure("timeout")] {
            assert!(result.is_degraded());
            for rec in &result.recommendations {
                assert!(char_len(rec) <= RECOMMENDATION_DISPLAY_LEN, "{rec}");
                assert!(within_length_bounds(rec), "{rec}");
            }
        }
    }
}
