//! Section markers and the line-classification state machine
//!
//! The expert prompt asks the model to open each section with a symbol, an
//! ordinal and a name (`🔍 1. Observed Damage:`). Models drop one or the other
//! often enough that a marker is recognised when its symbol is present together
//! with either the name or the `<n>.` ordinal.

/// Symbol that opens the closing Constraints block
pub const CONSTRAINTS_SYMBOL: &str = "📏";

/// Parser state; the section whose content is currently being read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Section {
    #[default]
    None,
    Damage,
    Mode,
    Cause,
    Confidence,
    Recommendations,
}

/// A heading recognised in model output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionMarker {
    /// Substring that must be present. The gear glyph is matched without
    /// its emoji variation selector, which models sometimes omit.
    pub symbol: &'static str,
    /// Glyph used when rendering the heading
    pub glyph: &'static str,
    /// Ordinal accepted in place of the name (`Some(1)` matches `1.`)
    pub ordinal: Option<u8>,
    /// Literal section name as written in the prompt
    pub name: &'static str,
    /// Other names accepted for the same section
    pub aliases: &'static [&'static str],
    /// State entered when this marker is seen
    pub target: Section,
}

/// Markers in priority order. The first match wins.
pub static SECTION_MARKERS: [SectionMarker; 6] = [
    SectionMarker {
        symbol: "🔍",
        glyph: "🔍",
        ordinal: Some(1),
        name: "Observed Damage",
        aliases: &[],
        target: Section::Damage,
    },
    SectionMarker {
        symbol: "\u{2699}",
        glyph: "\u{2699}\u{FE0F}",
        ordinal: Some(2),
        name: "Failure Mode",
        aliases: &[],
        target: Section::Mode,
    },
    SectionMarker {
        symbol: "🧠",
        glyph: "🧠",
        ordinal: Some(3),
        name: "Root Cause Analysis",
        aliases: &[],
        target: Section::Cause,
    },
    SectionMarker {
        symbol: "🔢",
        glyph: "🔢",
        ordinal: Some(4),
        name: "Confidence Score",
        aliases: &[],
        target: Section::Confidence,
    },
    SectionMarker {
        symbol: "💡",
        glyph: "💡",
        ordinal: Some(5),
        name: "Brief Recommendations",
        aliases: &["Specific Recommendations"],
        target: Section::Recommendations,
    },
    SectionMarker {
        symbol: CONSTRAINTS_SYMBOL,
        glyph: CONSTRAINTS_SYMBOL,
        ordinal: None,
        name: "Constraints",
        aliases: &[],
        target: Section::None,
    },
];

impl SectionMarker {
    /// Symbol present AND (name present OR `<n>.` present)
    pub fn matches(&self, line: &str) -> bool {
        if !line.contains(self.symbol) {
            return false;
        }

        let named = line.contains(self.name) || self.aliases.iter().any(|a| line.contains(a));
        let numbered = self
            .ordinal
            .map(|n| line.contains(&format!("{}.", n)))
            .unwrap_or(false);

        named || numbered
    }

    /// Heading as written in the prompt, e.g. `🔍 1. Observed Damage:`
    pub fn heading(&self) -> String {
        match self.ordinal {
            Some(n) => format!("{} {}. {}:", self.glyph, n, self.name),
            None => format!("{} {}:", self.glyph, self.name),
        }
    }

    /// Marker that leads into `section`
    pub fn for_section(section: Section) -> &'static SectionMarker {
        SECTION_MARKERS
            .iter()
            .find(|m| m.target == section)
            .unwrap_or(&SECTION_MARKERS[SECTION_MARKERS.len() - 1])
    }
}

/// First marker matching a trimmed line
pub fn classify_marker(line: &str) -> Option<&'static SectionMarker> {
    SECTION_MARKERS.iter().find(|m| m.matches(line))
}

/// What the machine did with one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    /// Blank line, state unchanged
    Skip,
    /// Marker line; state moved to the section
    Enter(Section),
    /// Content line for the current section
    Content(Section, &'a str),
}

/// Tracks the current section while lines are fed top to bottom
#[derive(Debug, Clone, Default)]
pub struct SectionMachine {
    current: Section,
    markers_seen: usize,
}

impl SectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Section {
        self.current
    }

    /// Number of marker lines seen so far
    pub fn markers_seen(&self) -> usize {
        self.markers_seen
    }

    /// Feed one raw line
    pub fn step<'a>(&mut self, line: &'a str) -> Step<'a> {
        let line = line.trim();
        if line.is_empty() {
            return Step::Skip;
        }

        if let Some(marker) = classify_marker(line) {
            self.current = marker.target;
            self.markers_seen += 1;
            return Step::Enter(marker.target);
        }

        Step::Content(self.current, line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_requires_symbol() {
        assert!(classify_marker("1. Observed Damage:").is_none());
        assert!(classify_marker("Failure Mode: fatigue").is_none());
    }

    #[test]
    fn test_marker_name_or_ordinal() {
        assert_eq!(classify_marker("🔍 Observed Damage").map(|m| m.target), Some(Section::Damage));
        assert_eq!(classify_marker("🔍 1.").map(|m| m.target), Some(Section::Damage));
        assert_eq!(classify_marker("### 🧠 3. Root causes").map(|m| m.target), Some(Section::Cause));
        assert!(classify_marker("🔍 Damage overview").is_none());
    }

    #[test]
    fn test_gear_without_variation_selector() {
        assert_eq!(classify_marker("\u{2699} 2. Failure Mode:").map(|m| m.target), Some(Section::Mode));
        assert_eq!(
            classify_marker("\u{2699}\u{FE0F} Failure Mode:").map(|m| m.target),
            Some(Section::Mode)
        );
    }

    #[test]
    fn test_recommendation_aliases() {
        assert_eq!(
            classify_marker("💡 Specific Recommendations").map(|m| m.target),
            Some(Section::Recommendations)
        );
        assert_eq!(
            classify_marker("**💡 5. Brief Recommendations:**").map(|m| m.target),
            Some(Section::Recommendations)
        );
    }

    #[test]
    fn test_constraints_needs_name() {
        assert_eq!(classify_marker("📏 Constraints:").map(|m| m.target), Some(Section::None));
        assert!(classify_marker("📏 6.").is_none());
    }

    #[test]
    fn test_headings_match_themselves() {
        for marker in SECTION_MARKERS.iter() {
            assert_eq!(classify_marker(&marker.heading()), Some(marker));
        }
    }

    #[test]
    fn test_machine_transitions() {
        let mut machine = SectionMachine::new();
        assert_eq!(machine.step("preamble"), Step::Content(Section::None, "preamble"));
        assert_eq!(machine.step("🔢 4. Confidence Score:"), Step::Enter(Section::Confidence));
        assert_eq!(machine.step("   "), Step::Skip);
        assert_eq!(machine.current(), Section::Confidence);
        assert_eq!(machine.step("  Confidence: 70%  "), Step::Content(Section::Confidence, "Confidence: 70%"));
        assert_eq!(machine.step("📏 Constraints:"), Step::Enter(Section::None));
        assert_eq!(machine.current(), Section::None);
        assert_eq!(machine.markers_seen(), 2);
    }

    #[test]
    fn test_for_section() {
        assert_eq!(SectionMarker::for_section(Section::Cause).name, "Root Cause Analysis");
        assert_eq!(SectionMarker::for_section(Section::None).name, "Constraints");
    }
}
