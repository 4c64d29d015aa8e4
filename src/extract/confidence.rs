// Initial confidence scoring for extracted candidates.
//
// A category base rate plus two name-shape bonuses, clamped to 1.0.
// Deterministic and pure - the LLM validator may later replace these
// scores with its own.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::signals::lexicon::SignalCategory;

/// Numeric version token ("5", "2.0", "180").
fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.?\d*").unwrap())
}

/// Product-type suffix tokens that make a name more likely to be a real
/// product ("Claude AI", "o1 model").
const TYPE_SUFFIXES: [&str; 3] = ["ai", "model", "tool"];

/// Score a candidate name in [0, 1] from its signal category and shape.
pub fn initial_confidence(category: SignalCategory, raw_name: &str) -> f64 {
    let base: f64 = match category {
        // Launch talk is the most reliable signal of a product mention.
        SignalCategory::Launch | SignalCategory::Announcement => 0.9,
        SignalCategory::Availability | SignalCategory::New => 0.7,
        SignalCategory::Comparison | SignalCategory::Testing => 0.6,
        // Excitement words are mostly noise.
        SignalCategory::Excitement => 0.3,
    };

    let mut score = base;

    if version_re().find(raw_name).is_some() {
        score += 0.1;
    }
    if has_type_suffix(raw_name) {
        score += 0.1;
    }

    score.min(1.0)
}

/// True when any token after the first is a recognized product-type suffix.
fn has_type_suffix(raw_name: &str) -> bool {
    raw_name
        .split(|c: char| c.is_whitespace() || c == '-')
        .skip(1)
        .any(|token| TYPE_SUFFIXES.iter().any(|s| token.eq_ignore_ascii_case(s)))
}
