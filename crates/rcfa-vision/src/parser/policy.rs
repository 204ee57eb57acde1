//! Tunable limits applied while parsing model output

/// Root causes kept from the Root Cause Analysis section
pub const MAX_ROOT_CAUSES: usize = 2;

/// Recommendations kept after filtering
pub const MAX_RECOMMENDATIONS: usize = 4;

/// A recommendation must be strictly longer than this (chars)
pub const RECOMMENDATION_MIN_LEN: usize = 2;

/// A recommendation must be strictly shorter than this (chars)
pub const RECOMMENDATION_MAX_LEN: usize = 50;

/// Recommendations longer than this are shortened for display
pub const RECOMMENDATION_DISPLAY_LEN: usize = 40;

/// Appended to shortened recommendations
pub const ELLIPSIS: &str = "...";

/// Confidence used when the response carries no usable percentage
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

/// Responses above this size (1 MiB) are rejected before scanning and
/// produce the degraded parse-failure result
pub const MAX_RESPONSE_BYTES: usize = 1024 * 1024;
