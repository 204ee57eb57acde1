//! Expert prompt for bearing failure analysis
//!
//! The prompt asks for five marked sections followed by a Constraints block.
//! Section headings are rendered from [`SECTION_MARKERS`] so the parser and the
//! prompt cannot drift apart.
//!
//! Motor mounting decides whether electrical-erosion guidance is included:
//! - mounted: evaluate fluting / arc pitting, but only for symmetric, repeated patterns
//! - not mounted: exclude electrical erosion explicitly
//! - unknown: say nothing either way

use crate::parser::section::{SectionMarker, SECTION_MARKERS};
use crate::parser::Section;
use rcfa_types::{AnalysisContext, MotorMounting};

/// Reply the model is told to give when no bearing is visible
pub const NO_BEARING_RESPONSE: &str =
    "No bearing detected or image unclear. Please upload a clear bearing image.";

/// Substring of [`NO_BEARING_RESPONSE`] the parser looks for
pub const NO_BEARING_MARKER: &str = "No bearing detected";

const MOUNTED_EROSION_NOTE: &str = "\
- Evaluate electrical erosion (e.g., fluting, arc pitting, EDM marks).
- Look for evenly spaced axial fluting and arc-shaped pits or EDM-like craters across the raceway.
- Only consider it if the patterns are symmetric, repeated and consistent with electrical discharge.";

const NOT_MOUNTED_EROSION_NOTE: &str = "\
- Do NOT consider electrical erosion or current-related damage.
- This bearing is not mounted on a motor.";

// ============================================================================
// Context block
// ============================================================================

/// One line per field present in the context; empty when nothing is known
pub fn build_context_block(context: &AnalysisContext) -> String {
    let mut lines: Vec<String> = Vec::new();

    if let Some(bearing_type) = context.bearing_type {
        lines.push(format!(
            "Bearing Type: {} (analyze all findings in the context of this bearing type)",
            bearing_type.as_str().to_uppercase()
        ));
    }

    match context.motor_mounting {
        MotorMounting::Mounted => {
            lines.push("Motor Mounting: MOUNTED ON A MOTOR (consider this in your analysis)".to_string())
        }
        MotorMounting::NotMounted => lines
            .push("Motor Mounting: NOT MOUNTED ON A MOTOR (consider this in your analysis)".to_string()),
        MotorMounting::Unknown => {}
    }

    if let Some(application) = context.application() {
        lines.push(format!("Application: {}", application));
    }

    if let Some(additional) = context.additional_context() {
        lines.push(format!("Additional Context: {}", additional));
    }

    lines.join("\n")
}

/// Electrical-erosion guidance for the mounting status, if any
pub fn electrical_erosion_note(mounting: MotorMounting) -> Option<&'static str> {
    match mounting {
        MotorMounting::Mounted => Some(MOUNTED_EROSION_NOTE),
        MotorMounting::NotMounted => Some(NOT_MOUNTED_EROSION_NOTE),
        MotorMounting::Unknown => None,
    }
}

// ============================================================================
// Expert prompt
// ============================================================================

fn heading(section: Section) -> String {
    SectionMarker::for_section(section).heading()
}

/// Build the full instruction text sent with the bearing photo
pub fn build_expert_prompt(context: &AnalysisContext) -> String {
    let context_block = build_context_block(context);
    let erosion = electrical_erosion_note(context.motor_mounting)
        .map(|note| format!("{}\n", note))
        .unwrap_or_default();

    let mut prompt = String::new();

    prompt.push_str(&format!(
        concat!(
            "You are a Bearing Failure Analysis Expert.\n\n",
            "**IMPORTANT:**\n",
            "- First, check whether the uploaded image actually shows a bearing or a bearing component.\n",
            "- If you are not sure a bearing is present, or the image is unclear, respond only with:\n",
            "  \"{sentinel}\"\n",
            "  and do not attempt further analysis.\n\n",
            "If a bearing is present, analyze the attached image of a bearing ring (inner or outer) ",
            "using only visible surface evidence.\n",
            "**Always consider the bearing type and motor mounting status in your analysis and conclusions.**\n",
        ),
        sentinel = NO_BEARING_RESPONSE,
    ));

    if !context_block.is_empty() {
        prompt.push('\n');
        prompt.push_str(&context_block);
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        concat!(
            "\n{damage}\n",
            "- Describe surface damage precisely: type, shape, distribution, size, and location ",
            "(e.g., raceway, shoulder, chamfer).\n",
            "- Focus on visible features only: pitting, smearing, fluting, false brinelling, scoring, etc.\n",
            "- Use bullets. No speculation.\n",
        ),
        damage = heading(Section::Damage),
    ));

    prompt.push_str(&format!(
        concat!(
            "\n{mode}\n",
            "- Identify the most likely failure mechanism based on the damage patterns:\n",
            "  * fatigue, abrasion, lubrication failure, contamination, electrical erosion, ",
            "improper mounting, misalignment, etc.\n",
            "- Do NOT over-prioritize electrical erosion unless clearly supported (e.g., axial fluting, EDM pits). ",
            "Only consider it if patterns are symmetrical, repeated, and consistent.\n",
            "{erosion}",
            "- Give equal or more focus to mounting damage signs: false brinelling, ring creep, ",
            "rotated wear bands, shoulder polishing, fretting.\n",
        ),
        mode = heading(Section::Mode),
        erosion = erosion,
    ));

    prompt.push_str(&format!(
        concat!(
            "\n{cause}\n",
            "- State the **most likely** root cause (or 2 max if equally likely).\n",
            "- Justify it based ONLY on image evidence.\n",
            "- Stay objective. Do not assume lubrication, electrical or misalignment causes unless visible.\n",
            "- Examples of causes: contamination ingress, misfit mounting, uneven loading, loose fits, ",
            "thermal expansion, vibration, motor grounding failure, etc.\n",
            "{erosion}",
        ),
        cause = heading(Section::Cause),
        erosion = erosion,
    ));

    prompt.push_str(&format!(
        concat!(
            "\n{confidence}\n",
            "- Provide as: Confidence: XX%\n",
            "- Base it on the clarity of visible damage.\n",
            "- Avoid high confidence unless patterns are distinctive.\n",
        ),
        confidence = heading(Section::Confidence),
    ));

    prompt.push_str(&format!(
        concat!(
            "\n{recommendations}\n",
            "- Give exactly 3 short, actionable recommendations. Each should be:\n",
            "  * Under 8 words\n",
            "  * Direct and specific (no explanations)\n",
        ),
        recommendations = heading(Section::Recommendations),
    ));

    prompt.push_str(&format!(
        concat!(
            "\n{constraints}\n",
            "- Stick to 1-2 causes only.\n",
            "- All reasoning must trace back to the image.\n",
            "- Be concise. Avoid repetition or generic advice.\n",
            "- Stick to the relevant failure mode and root cause only.\n",
            "- Avoid long paragraphs. Bullet points or tight sentences.\n",
            "- Use consistent terminology for similar patterns across cases.\n",
            "- Avoid electrical erosion bias. Focus on it only if visually supported.\n",
        ),
        constraints = heading(Section::None),
    ));

    prompt
}

/// Headings in the order the prompt lists them
pub fn section_headings() -> Vec<String> {
    SECTION_MARKERS.iter().map(|m| m.heading()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcfa_types::BearingType;

    fn lower(prompt: &str) -> String {
        prompt.to_lowercase()
    }

    #[test]
    fn test_unknown_mounting_has_no_erosion_clause() {
        let prompt = lower(&build_expert_prompt(&AnalysisContext::default()));
        assert!(!prompt.contains("evaluate electrical erosion"));
        assert!(!prompt.contains("do not consider electrical erosion"));
        assert!(!prompt.contains("motor mounting:"));
    }

    #[test]
    fn test_mounted_includes_evaluation_guidance() {
        let ctx = AnalysisContext::default().with_motor_mounting(MotorMounting::Mounted);
        let prompt = build_expert_prompt(&ctx);
        assert!(prompt.contains("Motor Mounting: MOUNTED ON A MOTOR"));
        assert!(prompt.contains("Evaluate electrical erosion"));
        assert!(prompt.contains("symmetric, repeated"));
        assert!(!prompt.contains("Do NOT consider electrical erosion"));
    }

    #[test]
    fn test_not_mounted_excludes_erosion() {
        let ctx = AnalysisContext::default().with_motor_mounting(MotorMounting::NotMounted);
        let prompt = build_expert_prompt(&ctx);
        assert!(prompt.contains("Motor Mounting: NOT MOUNTED ON A MOTOR"));
        assert!(prompt.contains("Do NOT consider electrical erosion"));
        assert!(!prompt.contains("Evaluate electrical erosion"));
    }

    #[test]
    fn test_context_block_lists_only_present_fields() {
        assert_eq!(build_context_block(&AnalysisContext::default()), "");

        let ctx = AnalysisContext::default()
            .with_bearing_type(BearingType::Roller)
            .with_application("Industrial machinery");
        let block = build_context_block(&ctx);
        assert_eq!(block.lines().count(), 2);
        assert!(block.starts_with("Bearing Type: ROLLER_BEARING"));
        assert!(block.contains("Application: Industrial machinery"));
        assert!(!block.contains("Additional Context"));
    }

    #[test]
    fn test_full_context_block() {
        let ctx = AnalysisContext::default()
            .with_bearing_type(BearingType::Spherical)
            .with_motor_mounting(MotorMounting::Mounted)
            .with_application("Pump")
            .with_additional_context("High-speed operation, 24/7 usage");
        let block = build_context_block(&ctx);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("Motor Mounting:"));
        assert_eq!(lines[3], "Additional Context: High-speed operation, 24/7 usage");
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let prompt = build_expert_prompt(&AnalysisContext::default());
        let positions: Vec<usize> = section_headings()
            .iter()
            .map(|h| prompt.find(h.as_str()).expect("heading present"))
            .collect();
        assert_eq!(positions.len(), 6);
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_prompt_asks_for_bearing_check_first() {
        let prompt = build_expert_prompt(&AnalysisContext::default());
        let sentinel = prompt.find(NO_BEARING_RESPONSE).expect("sentinel present");
        let first_section = prompt.find("🔍 1. Observed Damage:").expect("first section");
        assert!(sentinel < first_section);
        assert!(prompt.contains("Confidence: XX%"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let ctx = AnalysisContext::default().with_bearing_type(BearingType::Needle);
        assert_eq!(build_expert_prompt(&ctx), build_expert_prompt(&ctx));
    }
}
