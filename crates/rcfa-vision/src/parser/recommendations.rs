//! Recommendation filtering and shortening

use super::policy::{
    ELLIPSIS, MAX_RECOMMENDATIONS, RECOMMENDATION_DISPLAY_LEN, RECOMMENDATION_MAX_LEN,
    RECOMMENDATION_MIN_LEN,
};
use super::section::CONSTRAINTS_SYMBOL;
use super::text::char_len;

/// Words that mark a line as a section heading rather than an item
pub const HEADER_KEYWORDS: &[&str] = &["constraints", "recommendations", "brief", "specific"];

/// Used when the model produced no usable recommendation
pub const FALLBACK_RECOMMENDATIONS: [&str; 3] = [
    "Conduct additional visual inspection",
    "Perform vibration analysis if possible",
    "Check operating and maintenance history",
];

pub fn fallback_recommendations() -> Vec<String> {
    FALLBACK_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect()
}

/// Length strictly inside the accepted bounds
pub fn within_length_bounds(item: &str) -> bool {
    let len = char_len(item);
    len > RECOMMENDATION_MIN_LEN && len < RECOMMENDATION_MAX_LEN
}

/// Contains one of [`HEADER_KEYWORDS`], case-insensitive
pub fn is_header_like(item: &str) -> bool {
    let lower = item.to_lowercase();
    HEADER_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Cut at the last space inside the display length and append an ellipsis.
///
/// Items that fit are returned unchanged. A head without any space is kept whole.
pub fn shorten_for_display(item: &str) -> String {
    if char_len(item) <= RECOMMENDATION_DISPLAY_LEN {
        return item.to_string();
    }

    let head: String = item.chars().take(RECOMMENDATION_DISPLAY_LEN).collect();
    let cut = match head.rfind(' ') {
        Some(idx) => &head[..idx],
        None => head.as_str(),
    };
    format!("{}{}", cut, ELLIPSIS)
}

/// Trim, bound, de-header, cap and shorten candidate recommendations.
///
/// An empty outcome is replaced by [`FALLBACK_RECOMMENDATIONS`].
pub fn filter_recommendations<I, S>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let filtered: Vec<String> = candidates
        .into_iter()
        .map(|c| c.as_ref().trim().to_string())
        .filter(|c| within_length_bounds(c))
        .filter(|c| !c.starts_with(CONSTRAINTS_SYMBOL))
        .filter(|c| !is_header_like(c))
        .take(MAX_RECOMMENDATIONS)
        .map(|c| shorten_for_display(&c))
        .collect();

    if filtered.is_empty() {
        fallback_recommendations()
    } else {
        filtered
    }
}
