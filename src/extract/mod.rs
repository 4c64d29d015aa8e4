// Candidate extraction - turns signals into tentative product names.
//
// Dispatch is by signal category through a fixed strategy table; every
// candidate that survives the length and exclusion checks gets an initial
// confidence from the scorer. Failed candidates are dropped silently:
// noise is the expected, high-frequency case here, not an error.

pub mod confidence;
pub mod strategy;

use std::collections::HashSet;

use serde::Serialize;

use crate::posts::Post;
use crate::signals::detector::Signal;
use crate::signals::lexicon::{SignalCategory, EXCLUDE_TERMS};

use confidence::initial_confidence;
use strategy::ExtractionStrategy;

/// A tentative product-name mention, not yet deduplicated or classified.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub raw_name: String,
    pub source_post_id: String,
    pub signal_category: SignalCategory,
    pub signal_phrase: String,
    pub confidence: f64,
}

/// Candidate extractor with its configured filters.
pub struct Extractor {
    /// Character width on each side of the signal for the fallback strategy.
    pub context_window: usize,
    /// Names that must never survive as candidates (generic terms, bare
    /// company names). Matched exactly, case-sensitive.
    pub exclusion: HashSet<String>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            context_window: 100,
            exclusion: EXCLUDE_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Extractor {
    /// Extract candidates from one post given its detected signals.
    pub fn extract(&self, post: &Post, signals: &[Signal]) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for signal in signals {
            let strategy = ExtractionStrategy::for_category(signal.category);
            for raw in strategy.extract(&post.text, signal, self.context_window) {
                let name = raw.trim();
                // Too short or excluded - drop without comment.
                if name.chars().count() < 2 {
                    continue;
                }
                if self.exclusion.contains(name) {
                    continue;
                }

                candidates.push(Candidate {
                    raw_name: name.to_string(),
                    source_post_id: post.id.clone(),
                    signal_category: signal.category,
                    signal_phrase: signal.phrase.to_string(),
                    confidence: initial_confidence(signal.category, name),
                });
            }
        }

        candidates
    }
}
