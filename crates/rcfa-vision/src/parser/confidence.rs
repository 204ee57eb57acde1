//! Confidence percentage extraction

use regex::Regex;
use std::sync::LazyLock;

static PERCENTAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)%").expect("valid percentage pattern"));

/// Whether a line in the Confidence section is worth inspecting
pub fn mentions_confidence(line: &str) -> bool {
    line.contains('%') || line.to_lowercase().contains("confidence")
}

/// First `<digits>%` on the line as a fraction (`85%` -> 0.85).
///
/// The value is not range-checked here; the parser resets out-of-range
/// values after the scan.
pub fn extract_confidence(line: &str) -> Option<f64> {
    let caps = PERCENTAGE.captures(line)?;
    let digits = caps.get(1)?.as_str();
    digits.parse::<f64>().ok().map(|pct| pct / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_confidence() {
        assert_eq!(extract_confidence("Confidence: 85%"), Some(0.85));
        assert_eq!(extract_confidence("no number here"), None);
    }

    #[test]
    fn test_extract_first_match_only() {
        assert_eq!(extract_confidence("60% now, was 90% before"), Some(0.6));
    }

    #[test]
    fn test_extract_ignores_bare_numbers() {
        assert_eq!(extract_confidence("Confidence: 85 percent"), None);
        assert_eq!(extract_confidence("Confidence: 85 %"), None);
    }

    #[test]
    fn test_extract_out_of_range_is_passed_through() {
        assert_eq!(extract_confidence("150%"), Some(1.5));
    }

    #[test]
    fn test_mentions_confidence() {
        assert!(mentions_confidence("CONFIDENCE is moderate"));
        assert!(mentions_confidence("about 70%"));
        assert!(!mentions_confidence("Based on clarity of damage"));
    }
}
