//! Response parser - turns the model's sectioned prose into an AnalysisResult
//!
//! Lines are fed through a [`SectionMachine`]; content lines are accumulated
//! per section and the result is assembled with fallbacks once the scan ends.
//! Parsing never fails from the caller's point of view: malformed text ends up
//! as fallback values and a scan failure ends up as a degraded result.
//!
//! Input is capped at [`policy::MAX_RESPONSE_BYTES`] (1 MiB). A model reply is
//! a few kilobytes at most, so anything larger is treated as a broken upstream
//! and yields the degraded result without being scanned.

pub mod confidence;
pub mod fallback;
pub mod policy;
pub mod recommendations;
pub mod section;
pub mod text;

pub use confidence::{extract_confidence, mentions_confidence};
pub use recommendations::{filter_recommendations, FALLBACK_RECOMMENDATIONS};
pub use section::{classify_marker, Section, SectionMachine, SectionMarker, Step, SECTION_MARKERS};
pub use text::clean_text_line;

use crate::ai::prompts::NO_BEARING_MARKER;
use policy::{DEFAULT_CONFIDENCE, MAX_RESPONSE_BYTES, MAX_ROOT_CAUSES, RECOMMENDATION_MAX_LEN, RECOMMENDATION_MIN_LEN};
use rcfa_types::AnalysisResult;
use recommendations::{is_header_like, within_length_bounds};
use section::CONSTRAINTS_SYMBOL;
use std::any::Any;
use std::panic;
use text::{char_len, strip_list_prefix, ListItem};
use thiserror::Error;
use tracing::{debug, warn};

/// Technical note attached to every successfully parsed result
pub const DEFAULT_TECHNICAL_NOTES: &str = "Analysis performed using Gemini vision model";

/// Why a response could not be scanned
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("scanner panicked: {0}")]
    Panicked(String),
}

/// Parses model responses into [`AnalysisResult`]s.
///
/// Holds no per-call state, so one parser can be shared between threads.
#[derive(Debug, Clone)]
pub struct ResponseParser {
    technical_notes: String,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self {
            technical_notes: DEFAULT_TECHNICAL_NOTES.to_string(),
        }
    }
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the note attached to parsed results (e.g. to name another model)
    pub fn with_technical_notes(mut self, notes: impl Into<String>) -> Self {
        self.technical_notes = notes.into();
        self
    }

    /// Parse a raw model response. Always returns a fully populated result.
    pub fn parse(&self, raw: &str) -> AnalysisResult {
        debug!("raw model response ({} bytes):\n{}", raw.len(), raw);

        match scan(raw) {
            Ok(state) => {
                let result = state.into_result(&self.technical_notes);
                debug!(
                    observed_damage = %result.observed_damage,
                    failure_mode = %result.failure_mode,
                    root_causes = ?result.root_cause_analysis,
                    recommendations = ?result.recommendations,
                    confidence = result.confidence_score,
                    "parsed model response"
                );
                result
            }
            Err(e) => {
                warn!(error = %e, "failed to parse model response");
                fallback::parse_failure(&e.to_string())
            }
        }
    }
}

/// Accumulators for one parse call
#[derive(Debug, Default)]
struct ParseState {
    machine: SectionMachine,
    observed_damage: String,
    failure_mode: String,
    root_causes: Vec<String>,
    recommendations: Vec<String>,
    confidence: Option<f64>,
    no_bearing_reported: bool,
}

fn scan(raw: &str) -> Result<ParseState, ParseError> {
    if raw.len() > MAX_RESPONSE_BYTES {
        return Err(ParseError::TooLarge {
            size: raw.len(),
            limit: MAX_RESPONSE_BYTES,
        });
    }

    panic::catch_unwind(|| {
        let mut state = ParseState::default();
        for line in raw.lines() {
            state.feed(line);
        }
        state
    })
    .map_err(|payload| ParseError::Panicked(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Prose sections are single paragraphs; bullets are joined into one string
fn append_sentence(target: &mut String, line: &str) {
    let body = match strip_list_prefix(line) {
        ListItem::Bullet(body) => body,
        _ => line,
    };
    let cleaned = clean_text_line(body);
    if cleaned.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(&cleaned);
}

impl ParseState {
    fn feed(&mut self, line: &str) {
        let (section, content) = match self.machine.step(line) {
            Step::Skip | Step::Enter(_) => return,
            Step::Content(section, content) => (section, content),
        };

        match section {
            Section::None => {
                if content.contains(NO_BEARING_MARKER) {
                    self.no_bearing_reported = true;
                }
            }
            Section::Damage => append_sentence(&mut self.observed_damage, content),
            Section::Mode => append_sentence(&mut self.failure_mode, content),
            Section::Cause => self.accept_cause(content),
            Section::Confidence => {
                if mentions_confidence(content) {
                    if let Some(value) = extract_confidence(content) {
                        self.confidence = Some(value);
                    }
                }
            }
            Section::Recommendations => self.accept_recommendation(content),
        }
    }

    fn accept_cause(&mut self, line: &str) {
        let item = match strip_list_prefix(line) {
            ListItem::Plain(text) if text.starts_with(CONSTRAINTS_SYMBOL) => return,
            item => clean_text_line(item.body()),
        };

        // Extra causes are read and dropped
        if !item.is_empty() && self.root_causes.len() < MAX_ROOT_CAUSES {
            self.root_causes.push(item);
        }
    }

    fn accept_recommendation(&mut self, line: &str) {
        let candidate = match strip_list_prefix(line) {
            ListItem::Bullet(body) | ListItem::Ordinal(body) => clean_text_line(body),
            ListItem::Plain(text) => {
                if text.starts_with(CONSTRAINTS_SYMBOL) || text.starts_with("Constraints") {
                    return;
                }
                // Unmarked lines need one character more than list items
                let len = char_len(text);
                if len <= RECOMMENDATION_MIN_LEN + 1
                    || len >= RECOMMENDATION_MAX_LEN
                    || is_header_like(text)
                {
                    return;
                }
                clean_text_line(text)
            }
        };

        if within_length_bounds(&candidate) {
            self.recommendations.push(candidate);
        }
    }

    fn into_result(self, technical_notes: &str) -> AnalysisResult {
        if self.no_bearing_reported && self.machine.markers_seen() == 0 {
            return no_bearing_result();
        }

        let confidence_score = match self.confidence {
            Some(c) if (0.0..=1.0).contains(&c) => c,
            Some(c) => {
                debug!(confidence = c, "confidence out of range, using default");
                DEFAULT_CONFIDENCE
            }
            None => DEFAULT_CONFIDENCE,
        };

        let root_cause_analysis = if self.root_causes.is_empty() {
            vec![fallback::NO_ROOT_CAUSE_FALLBACK.to_string()]
        } else {
            self.root_causes
        };

        AnalysisResult {
            observed_damage: non_empty_or(self.observed_damage, fallback::NO_DAMAGE_FALLBACK),
            failure_mode: non_empty_or(self.failure_mode, fallback::NO_FAILURE_MODE_FALLBACK),
            root_cause_analysis,
            confidence_score,
            technical_notes: Some(technical_notes.to_string()),
            recommendations: filter_recommendations(self.recommendations),
            bearing_detected: true,
        }
    }
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

fn no_bearing_result() -> AnalysisResult {
    AnalysisResult {
        observed_damage: crate::ai::prompts::NO_BEARING_RESPONSE.to_string(),
        failure_mode: fallback::NO_FAILURE_MODE_FALLBACK.to_string(),
        root_cause_analysis: vec![fallback::NO_ROOT_CAUSE_FALLBACK.to_string()],
        confidence_score: 0.0,
        technical_notes: Some("Model reported no bearing in the image".to_string()),
        recommendations: recommendations::fallback_recommendations(),
        bearing_detected: false,
    }
}

/// Render a result back into the sectioned layout the prompt asks for.
///
/// Feeding the output to [`ResponseParser::parse`] yields the same fields for
/// results whose recommendations were not shortened.
pub fn render_sections(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let heading = |section| SectionMarker::for_section(section).heading();

    out.push_str(&heading(Section::Damage));
    out.push('\n');
    out.push_str(&result.observed_damage);
    out.push_str("\n\n");

    out.push_str(&heading(Section::Mode));
    out.push('\n');
    out.push_str(&result.failure_mode);
    out.push_str("\n\n");

    out.push_str(&heading(Section::Cause));
    out.push('\n');
    for cause in &result.root_cause_analysis {
        out.push_str(&format!("- {}\n", cause));
    }
    out.push('\n');

    out.push_str(&heading(Section::Confidence));
    out.push('\n');
    out.push_str(&format!(
        "Confidence: {}%\n\n",
        (result.confidence_score * 100.0).round() as u32
    ));

    out.push_str(&heading(Section::Recommendations));
    out.push('\n');
    for rec in &result.recommendations {
        out.push_str(&format!("- {}\n", rec));
    }
    out.push('\n');

    out.push_str(&heading(Section::None));
    out.push('\n');
    out
}
