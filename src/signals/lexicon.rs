// The signal lexicon - phrase categories mapped to the discrete phrases
// that trigger extraction. Pure data; the detector owns the scanning.
//
// Phrases are stored lowercase because all matching is case-insensitive.

use serde::{Deserialize, Serialize};

/// The kind of "release talk" a lexicon phrase expresses. The category
/// drives both the extraction strategy and the base confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalCategory {
    Launch,
    New,
    Announcement,
    Availability,
    Comparison,
    Excitement,
    Testing,
}

impl SignalCategory {
    /// All categories in detection order. The order is part of the detector's
    /// deterministic output contract.
    pub const ALL: [SignalCategory; 7] = [
        SignalCategory::Launch,
        SignalCategory::New,
        SignalCategory::Announcement,
        SignalCategory::Availability,
        SignalCategory::Comparison,
        SignalCategory::Excitement,
        SignalCategory::Testing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCategory::Launch => "launch",
            SignalCategory::New => "new",
            SignalCategory::Announcement => "announcement",
            SignalCategory::Availability => "availability",
            SignalCategory::Comparison => "comparison",
            SignalCategory::Excitement => "excitement",
            SignalCategory::Testing => "testing",
        }
    }

    /// The lexicon phrases for this category.
    pub fn phrases(&self) -> &'static [&'static str] {
        match self {
            SignalCategory::Launch => &[
                "just released",
                "just launched",
                "just announced",
                "just dropped",
                "now released",
                "now live",
                "is out",
                "has launched",
                "has released",
                "officially launched",
                "new release",
                "latest release",
                "releasing",
                "launched today",
                "released today",
                "announcing",
                "proud to announce",
            ],
            SignalCategory::New => &[
                "new model",
                "new tool",
                "new ai",
                "new product",
                "newest",
                "brand new",
                "all-new",
                "introducing new",
                "new version",
                "new update",
            ],
            SignalCategory::Announcement => &[
                "announced",
                "unveiling",
                "unveiled",
                "introducing",
                "presents",
                "debut",
                "launches",
                "releases",
                "rolling out",
                "shipping",
            ],
            SignalCategory::Availability => &[
                "available now",
                "now available",
                "can try",
                "try it now",
                "sign up",
                "get access",
                "early access",
                "beta access",
                "open beta",
                "public beta",
                "waitlist",
            ],
            SignalCategory::Comparison => &[
                "better than",
                "beats",
                "outperforms",
                "vs",
                "compared to",
                "alternative to",
                "competitor to",
                "rival to",
            ],
            SignalCategory::Excitement => &[
                "amazing",
                "incredible",
                "wow",
                "mind-blowing",
                "game changer",
                "revolutionary",
                "breakthrough",
                "impressive",
            ],
            SignalCategory::Testing => &[
                "tried",
                "tested",
                "using",
                "played with",
                "experimenting with",
                "hands on",
                "first look",
                "review of",
                "testing out",
            ],
        }
    }
}

impl std::fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overly generic terms and bare company names that must never survive as
/// product candidates on their own.
pub const EXCLUDE_TERMS: [&str; 17] = [
    "AI",
    "ChatGPT",
    "GPT",
    "LLM",
    "ML",
    "AGI",
    "GenAI",
    "Google",
    "OpenAI",
    "Anthropic",
    "Microsoft",
    "Meta",
    "Twitter",
    "X",
    "Tesla",
    "Apple",
    "Amazon",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_phrases_are_lowercase() {
        for category in SignalCategory::ALL {
            for phrase in category.phrases() {
                assert_eq!(
                    *phrase,
                    phrase.to_lowercase(),
                    "lexicon phrase {phrase:?} in {category} must be lowercase"
                );
            }
        }
    }

    #[test]
    fn test_no_phrase_is_empty() {
        for category in SignalCategory::ALL {
            assert!(!category.phrases().is_empty());
            for phrase in category.phrases() {
                assert!(!phrase.trim().is_empty());
            }
        }
    }
}
