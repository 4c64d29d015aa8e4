// Deduplication - exact normalization folding, then fuzzy cluster merging.
//
// Two distinct passes. The exact pass folds candidates whose names are the
// same after lowercasing and whitespace removal. The fuzzy pass (merge.rs)
// then joins near-duplicate names into clusters with union-find so the
// result does not depend on candidate order.

pub mod merge;

use std::collections::HashMap;

use serde::Serialize;

use crate::extract::Candidate;
use crate::signals::lexicon::SignalCategory;

/// A set of candidates judged equivalent, represented by one chosen name.
#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    pub name: String,
    pub confidence: f64,
    /// Ids of the posts this name was seen in, first-seen order, no repeats.
    pub supporting_posts: Vec<String>,
    /// Signal categories observed across the folded candidates, fold order.
    pub signal_categories: Vec<SignalCategory>,
}

impl Cluster {
    pub fn mention_count(&self) -> usize {
        self.supporting_posts.len()
    }

    /// The most frequent signal category across the cluster's candidates;
    /// ties go to the earliest seen.
    pub fn dominant_category(&self) -> Option<SignalCategory> {
        let mut best: Option<(SignalCategory, usize)> = None;
        for &category in &self.signal_categories {
            let count = self
                .signal_categories
                .iter()
                .filter(|c| **c == category)
                .count();
            match best {
                Some((_, n)) if n >= count => {}
                _ => best = Some((category, count)),
            }
        }
        best.map(|(c, _)| c)
    }
}

/// Normalize a name for exact-duplicate detection: lowercase, all
/// whitespace removed. Idempotent.
pub fn normalize(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Fold candidates with identical normalized names into clusters.
///
/// First-seen order decides both the cluster order and the surface form
/// kept as the cluster name; supporting posts are unioned and the
/// confidence is the maximum over the folded candidates.
pub fn exact_dedup(candidates: &[Candidate]) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        let key = normalize(&candidate.raw_name);
        match by_key.get(&key) {
            Some(&i) => {
                let cluster = &mut clusters[i];
                if !cluster.supporting_posts.contains(&candidate.source_post_id) {
                    cluster.supporting_posts.push(candidate.source_post_id.clone());
                }
                if candidate.confidence > cluster.confidence {
                    cluster.confidence = candidate.confidence;
                }
                cluster.signal_categories.push(candidate.signal_category);
            }
            None => {
                by_key.insert(key, clusters.len());
                clusters.push(Cluster {
                    name: candidate.raw_name.clone(),
                    confidence: candidate.confidence,
                    supporting_posts: vec![candidate.source_post_id.clone()],
                    signal_categories: vec![candidate.signal_category],
                });
            }
        }
    }

    clusters
}
