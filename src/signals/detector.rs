// Signal detector - scans post text for lexicon phrases.
//
// Matching is case-insensitive substring search. Each phrase reports its
// first occurrence only; a phrase repeated in one post still yields a
// single signal.

use crate::posts::Post;

use super::find_ignore_ascii_case;
use super::lexicon::SignalCategory;

/// One lexicon phrase found in a post. Ephemeral - produced per post and
/// consumed within the same pipeline pass.
#[derive(Debug, Clone)]
pub struct Signal {
    pub category: SignalCategory,
    pub phrase: &'static str,
    /// Byte offset of the first occurrence in the original text.
    pub offset: usize,
}

/// Scan a text for lexicon phrases. Returns signals in lexicon order
/// (category order, then phrase order within the category), which keeps the
/// downstream candidate stream deterministic.
pub fn detect_signals(text: &str) -> Vec<Signal> {
    let mut detected = Vec::new();

    for category in SignalCategory::ALL {
        for &phrase in category.phrases() {
            if let Some(offset) = find_ignore_ascii_case(text, phrase) {
                detected.push(Signal {
                    category,
                    phrase,
                    offset,
                });
            }
        }
    }

    detected
}

/// Aggregate signal statistics over a post collection.
#[derive(Debug, Clone, Default)]
pub struct SignalStatistics {
    /// (phrase, occurrences) sorted by count descending, phrase ascending.
    pub signal_counts: Vec<(String, usize)>,
    /// (category, occurrences) sorted by count descending, category ascending.
    pub category_counts: Vec<(SignalCategory, usize)>,
    /// Number of posts with at least one signal.
    pub signaled_posts: usize,
}

/// Count phrase and category occurrences across a post window.
pub fn signal_statistics(posts: &[Post]) -> SignalStatistics {
    use std::collections::HashMap;

    let mut by_phrase: HashMap<&'static str, usize> = HashMap::new();
    let mut by_category: HashMap<SignalCategory, usize> = HashMap::new();
    let mut signaled_posts = 0;

    for post in posts {
        let signals = detect_signals(&post.text);
        if signals.is_empty() {
            continue;
        }
        signaled_posts += 1;

        for signal in &signals {
            *by_phrase.entry(signal.phrase).or_insert(0) += 1;
            *by_category.entry(signal.category).or_insert(0) += 1;
        }
    }

    let mut signal_counts: Vec<(String, usize)> = by_phrase
        .into_iter()
        .map(|(p, n)| (p.to_string(), n))
        .collect();
    signal_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut category_counts: Vec<(SignalCategory, usize)> = by_category.into_iter().collect();
    category_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));

    SignalStatistics {
        signal_counts,
        category_counts,
        signaled_posts,
    }
}
