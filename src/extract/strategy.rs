// Per-category extraction strategies.
//
// Each signal category has one fixed strategy. The shared building blocks
// are a clause window (text up to the next punctuation mark or connective
// stop-word) and capitalized-word-sequence regexes anchored at either end
// of the signal phrase.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::signals::detector::Signal;
use crate::signals::find_ignore_ascii_case;
use crate::signals::lexicon::SignalCategory;

/// Clause boundary: punctuation, or a connective stop-word that ends the
/// phrase a product name can span.
fn boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)[,.!?:;]|\b(?:is|has|can|will|for|with|by|and|or)\b").unwrap()
    })
}

/// Capitalized word sequence at the start of a window. Later words may also
/// start with a digit so version tails like "Gemini 2.0" stay attached.
fn leading_cap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Z][A-Za-z0-9.\-]*(?:\s+[0-9A-Z][A-Za-z0-9.\-]*)*)").unwrap()
    })
}

/// Capitalized word sequence ending right before the signal phrase.
fn trailing_cap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([A-Z][A-Za-z0-9.\-]*(?:\s+[0-9A-Z][A-Za-z0-9.\-]*)*)\s*$").unwrap()
    })
}

/// Any capitalized word sequence (words of two or more characters), used by
/// the fallback context-window strategy.
fn cap_seq_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Z][A-Za-z0-9.\-]+(?:\s+[A-Z][A-Za-z0-9.\-]+)*").unwrap()
    })
}

/// How to pull a name out of the text near a signal. One variant per signal
/// category so the dispatch is exhaustive rather than stringly-matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Capitalized phrase after the signal (clause-bounded) and the one
    /// ending right before it - both yield independent candidates.
    NearSignal,
    /// "new <Phrase>": the phrase after the signal; a multi-word match also
    /// emits its first token as a secondary candidate.
    NewPhrase,
    /// "X vs Y" yields both sides; "better than X" and friends yield the
    /// phrase after the signal.
    Comparison,
    /// Capitalized phrase immediately after the signal, clause-bounded.
    ActionTarget,
    /// Every capitalized word sequence within a character window around the
    /// signal.
    ContextWindow,
}

impl ExtractionStrategy {
    pub fn for_category(category: SignalCategory) -> Self {
        match category {
            SignalCategory::Launch | SignalCategory::Announcement => ExtractionStrategy::NearSignal,
            SignalCategory::New => ExtractionStrategy::NewPhrase,
            SignalCategory::Comparison => ExtractionStrategy::Comparison,
            SignalCategory::Testing | SignalCategory::Availability => {
                ExtractionStrategy::ActionTarget
            }
            SignalCategory::Excitement => ExtractionStrategy::ContextWindow,
        }
    }

    /// Run the strategy. Returned names are raw - the caller applies the
    /// length and exclusion filters.
    pub fn extract(&self, text: &str, signal: &Signal, window: usize) -> Vec<String> {
        let Some(start) = find_ignore_ascii_case(text, signal.phrase) else {
            return Vec::new();
        };
        let end = start + signal.phrase.len();

        match self {
            ExtractionStrategy::NearSignal => {
                let mut names = Vec::new();
                if let Some(name) = phrase_after(&text[end..]) {
                    names.push(name);
                }
                if let Some(name) = phrase_before(&text[..start]) {
                    names.push(name);
                }
                names
            }

            ExtractionStrategy::NewPhrase => match phrase_after(&text[end..]) {
                Some(name) => {
                    let mut names = vec![name.clone()];
                    if let Some(first) = name.split_whitespace().next() {
                        if first.len() < name.len() {
                            names.push(first.to_string());
                        }
                    }
                    names
                }
                None => Vec::new(),
            },

            ExtractionStrategy::Comparison => {
                let mut names = Vec::new();
                if signal.phrase == "vs" {
                    if let Some(name) = phrase_before(&text[..start]) {
                        names.push(name);
                    }
                    if let Some(name) = phrase_after(&text[end..]) {
                        names.push(name);
                    }
                } else if let Some(name) = phrase_after(&text[end..]) {
                    names.push(name);
                }
                names
            }

            ExtractionStrategy::ActionTarget => phrase_after(&text[end..]).into_iter().collect(),

            ExtractionStrategy::ContextWindow => {
                let context = char_window(text, start, end, window);
                cap_seq_re()
                    .find_iter(context)
                    .map(|m| clean(m.as_str()))
                    .filter(|s| !s.is_empty())
                    .collect()
            }
        }
    }
}

/// Capitalized phrase at the start of the clause following the signal.
fn phrase_after(after: &str) -> Option<String> {
    let after = after.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
    let clause = match boundary_re().find(after) {
        Some(m) => &after[..m.start()],
        None => after,
    };
    leading_cap_re()
        .captures(clause)
        .map(|c| clean(c.get(1).unwrap().as_str()))
        .filter(|s| !s.is_empty())
}

/// Capitalized phrase ending immediately before the signal.
fn phrase_before(before: &str) -> Option<String> {
    trailing_cap_re()
        .captures(before)
        .map(|c| clean(c.get(1).unwrap().as_str()))
        .filter(|s| !s.is_empty())
}

/// Trim whitespace and dangling punctuation the capitalized-sequence
/// classes are allowed to carry mid-name ("Node.js", "GPT-4") but that mean
/// nothing at the edges ("Claude.").
fn clean(name: &str) -> String {
    name.trim()
        .trim_end_matches(['.', '-', ','])
        .trim()
        .to_string()
}

/// Slice `width` characters on each side of the byte range [start, end),
/// respecting UTF-8 boundaries.
fn char_window(text: &str, start: usize, end: usize, width: usize) -> &str {
    let mut lo = start;
    for _ in 0..width {
        match text[..lo].chars().next_back() {
            Some(c) => lo -= c.len_utf8(),
            None => break,
        }
    }
    let mut hi = end;
    for _ in 0..width {
        match text[hi..].chars().next() {
            Some(c) => hi += c.len_utf8(),
            None => break,
        }
    }
    &text[lo..hi]
}
