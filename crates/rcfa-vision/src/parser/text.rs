//! Line normalisation for model prose

use regex::Regex;
use std::sync::LazyLock;

static LEADING_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*+\s*").expect("valid leading-star pattern"));
static TRAILING_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\*+$").expect("valid trailing-star pattern"));
static BOLD_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*").expect("valid bold pattern"));
// Outer sides must not touch a word character, so `2*3 vs 4*5` is left alone
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\B\*([^\s*](?:[^*]*[^\s*])?)\*\B").expect("valid emphasis pattern")
});
static ISOLATED_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s\*\s").expect("valid isolated-star pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static ORDINAL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("valid ordinal pattern"));

const BULLET_CHARS: &[char] = &['*', '•', '-'];

/// Strip markdown emphasis and collapse whitespace.
///
/// Bold markers are removed before single-star emphasis is unwrapped so that
/// `**Pitting** observed *here*` comes out as `Pitting observed here`.
pub fn clean_text_line(line: &str) -> String {
    let line = line.trim();
    let line = LEADING_STARS.replace(line, "");
    let line = BOLD_MARKERS.replace_all(&line, "");
    let line = EMPHASIS.replace_all(&line, "$1");
    let line = TRAILING_STARS.replace(&line, "");
    let line = ISOLATED_STAR.replace_all(&line, " ");
    let line = WHITESPACE.replace_all(&line, " ");
    line.trim().to_string()
}

/// How a line inside a list section was introduced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListItem<'a> {
    /// `*`, `•` or `-` prefix, already stripped
    Bullet(&'a str),
    /// `<digits>.` prefix, already stripped
    Ordinal(&'a str),
    /// Anything else
    Plain(&'a str),
}

impl<'a> ListItem<'a> {
    /// Text with the list prefix removed
    pub fn body(&self) -> &'a str {
        match *self {
            ListItem::Bullet(s) | ListItem::Ordinal(s) | ListItem::Plain(s) => s,
        }
    }
}

/// Classify a trimmed line and strip its list prefix
pub fn strip_list_prefix(line: &str) -> ListItem<'_> {
    if line.starts_with(BULLET_CHARS) {
        return ListItem::Bullet(line.trim_start_matches(|c: char| BULLET_CHARS.contains(&c) || c == ' '));
    }

    if let Some(m) = ORDINAL_PREFIX.find(line) {
        return ListItem::Ordinal(&line[m.end()..]);
    }

    ListItem::Plain(line)
}

/// Length in characters, which is what the length limits are expressed in
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
