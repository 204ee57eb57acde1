//! Core types for bearing failure analysis

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Bearing construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum BearingType {
    #[serde(rename = "ball_bearing")]
    #[value(name = "ball_bearing", alias = "ball")]
    Ball,
    #[serde(rename = "roller_bearing")]
    #[value(name = "roller_bearing", alias = "roller")]
    Roller,
    #[serde(rename = "thrust_bearing")]
    #[value(name = "thrust_bearing", alias = "thrust")]
    Thrust,
    #[serde(rename = "needle_bearing")]
    #[value(name = "needle_bearing", alias = "needle")]
    Needle,
    #[serde(rename = "spherical_bearing")]
    #[value(name = "spherical_bearing", alias = "spherical")]
    Spherical,
    #[serde(rename = "tapered_roller")]
    #[value(name = "tapered_roller", alias = "tapered")]
    Tapered,
}

impl BearingType {
    /// Wire identifier, as accepted by the API and CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            BearingType::Ball => "ball_bearing",
            BearingType::Roller => "roller_bearing",
            BearingType::Thrust => "thrust_bearing",
            BearingType::Needle => "needle_bearing",
            BearingType::Spherical => "spherical_bearing",
            BearingType::Tapered => "tapered_roller",
        }
    }
}

impl std::fmt::Display for BearingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the bearing runs inside an electric motor.
///
/// `Unknown` is distinct from `NotMounted`: the prompt says nothing about
/// electrical erosion at all when the mounting is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorMounting {
    Mounted,
    NotMounted,
    #[default]
    Unknown,
}

impl From<Option<bool>> for MotorMounting {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => MotorMounting::Mounted,
            Some(false) => MotorMounting::NotMounted,
            None => MotorMounting::Unknown,
        }
    }
}

impl std::fmt::Display for MotorMounting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MotorMounting::Mounted => write!(f, "mounted"),
            MotorMounting::NotMounted => write!(f, "not-mounted"),
            MotorMounting::Unknown => write!(f, "unknown"),
        }
    }
}

/// Caller-supplied context for one analysis request
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisContext {
    #[serde(default)]
    pub bearing_type: Option<BearingType>,
    #[serde(default)]
    pub motor_mounting: MotorMounting,
    #[serde(default)]
    pub application: Option<String>,
    #[serde(default)]
    pub additional_context: Option<String>,
}

impl AnalysisContext {
    pub fn with_bearing_type(mut self, bearing_type: BearingType) -> Self {
        self.bearing_type = Some(bearing_type);
        self
    }

    pub fn with_motor_mounting(mut self, motor_mounting: MotorMounting) -> Self {
        self.motor_mounting = motor_mounting;
        self
    }

    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    pub fn with_additional_context(mut self, context: impl Into<String>) -> Self {
        self.additional_context = Some(context.into());
        self
    }

    /// Application text, if present and not blank
    pub fn application(&self) -> Option<&str> {
        non_blank(self.application.as_deref())
    }

    /// Additional context text, if present and not blank
    pub fn additional_context(&self) -> Option<&str> {
        non_blank(self.additional_context.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Structured bearing failure report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub observed_damage: String,
    pub failure_mode: String,
    pub root_cause_analysis: Vec<String>,
    pub confidence_score: f64,
    #[serde(default)]
    pub technical_notes: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// False when the model reported that no bearing is visible
    #[serde(default = "default_true")]
    pub bearing_detected: bool,
}

fn default_true() -> bool {
    true
}

impl AnalysisResult {
    /// Degraded results carry zero confidence
    pub fn is_degraded(&self) -> bool {
        self.confidence_score <= 0.0
    }
}

/// Analysis result plus request metadata handed to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analysis: AnalysisResult,
    pub processing_time_secs: f64,
    pub model_used: String,
    pub timestamp: DateTime<Utc>,
}

/// One image in a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub image_path: String,
    #[serde(default)]
    pub response: Option<AnalysisResponse>,
    #[serde(default)]
    pub error: Option<String>,
    /// Served from the result cache
    #[serde(default)]
    pub cached: bool,
}

/// Collected batch results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResults {
    pub entries: Vec<BatchEntry>,
    pub context: AnalysisContext,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl BatchResults {
    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.response.is_some()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded()
    }

    /// Degraded responses count as succeeded; this counts them separately
    pub fn degraded(&self) -> usize {
        self.entries
            .iter()
            .filter_map(|e| e.response.as_ref())
            .filter(|r| r.analysis.is_degraded())
            .count()
    }

    pub fn duration_secs(&self) -> f64 {
        (self.completed_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motor_mounting_from_option_bool() {
        assert_eq!(MotorMounting::from(Some(true)), MotorMounting::Mounted);
        assert_eq!(MotorMounting::from(Some(false)), MotorMounting::NotMounted);
        assert_eq!(MotorMounting::from(None), MotorMounting::Unknown);
    }

    #[test]
    fn test_bearing_type_wire_names() {
        let json = serde_json::to_string(&BearingType::Tapered).unwrap();
        assert_eq!(json, "\"tapered_roller\"");
        let parsed: BearingType = serde_json::from_str("\"roller_bearing\"").unwrap();
        assert_eq!(parsed, BearingType::Roller);
        assert_eq!(BearingType::Ball.to_string(), "ball_bearing");
    }

    #[test]
    fn test_context_blank_fields_are_absent() {
        let ctx = AnalysisContext::default()
            .with_application("   ")
            .with_additional_context(" 24/7 usage ");
        assert_eq!(ctx.application(), None);
        assert_eq!(ctx.additional_context(), Some("24/7 usage"));
    }

    #[test]
    fn test_result_defaults_bearing_detected() {
        let json = r#"{"observed_damage":"a","failure_mode":"b","root_cause_analysis":["c"],"confidence_score":0.5}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert!(result.bearing_detected);
        assert!(result.recommendations.is_empty());
        assert!(!result.is_degraded());
    }

    #[test]
    fn test_batch_counts() {
        let response = |confidence| AnalysisResponse {
            analysis: AnalysisResult {
                observed_damage: "a".to_string(),
                failure_mode: "b".to_string(),
                root_cause_analysis: vec!["c".to_string()],
                confidence_score: confidence,
                technical_notes: None,
                recommendations: Vec::new(),
                bearing_detected: true,
            },
            processing_time_secs: 1.0,
            model_used: "m".to_string(),
            timestamp: Utc::now(),
        };
        let entry = |response, error: Option<&str>| BatchEntry {
            image_path: "x.jpg".to_string(),
            response,
            error: error.map(String::from),
            cached: false,
        };

        let results = BatchResults {
            entries: vec![
                entry(Some(response(0.7)), None),
                entry(Some(response(0.0)), None),
                entry(None, Some("not an image")),
            ],
            ..Default::default()
        };
        assert_eq!(results.succeeded(), 2);
        assert_eq!(results.failed(), 1);
        assert_eq!(results.degraded(), 1);
    }
}
