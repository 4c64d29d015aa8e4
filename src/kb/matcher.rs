// Knowledge-base matcher - classifies clusters against one snapshot.
//
// A normalized index is built once per call: canonical names first, then
// aliases. Canonical keys win collisions with aliases; a later alias
// overwrites an earlier alias for the same key. The index keeps insertion
// order in a Vec beside the lookup map so the substring scan's
// first-match-wins tie-break is deterministic.

use std::collections::HashMap;

use crate::dedupe::Cluster;

use super::models::{
    AmbiguousProduct, ClassificationResult, CompanyMention, ExistingProduct, KnowledgeBaseSnapshot,
    MatchType, NewProduct,
};

/// Company and organization names that are entities, not products.
pub const COMPANY_ENTITIES: [&str; 13] = [
    "Google",
    "Microsoft",
    "Meta",
    "OpenAI",
    "Anthropic",
    "xAI",
    "NVIDIA",
    "Apple",
    "Amazon",
    "Tesla",
    "DeepMind",
    "Hugging Face",
    "Stability AI",
];

/// Matcher-side name normalization: trim and lowercase. Unlike the dedup
/// normalization this keeps interior whitespace, so "cursor ai" can match
/// the alias "Cursor AI".
pub fn index_key(name: &str) -> String {
    name.trim().to_lowercase()
}

struct IndexSlot {
    key: String,
    entry: usize,
    match_type: MatchType,
}

/// Ordered normalized index over a snapshot's canonical names and aliases.
pub struct NormalizedIndex<'a> {
    snapshot: &'a KnowledgeBaseSnapshot,
    slots: Vec<IndexSlot>,
    by_key: HashMap<String, usize>,
}

impl<'a> NormalizedIndex<'a> {
    pub fn build(snapshot: &'a KnowledgeBaseSnapshot) -> Self {
        let mut slots: Vec<IndexSlot> = Vec::new();
        let mut by_key: HashMap<String, usize> = HashMap::new();

        // Canonical names first - they own their key unconditionally.
        for (i, entry) in snapshot.entries.iter().enumerate() {
            let key = index_key(&entry.canonical_name);
            if by_key.contains_key(&key) {
                continue;
            }
            by_key.insert(key.clone(), slots.len());
            slots.push(IndexSlot {
                key,
                entry: i,
                match_type: MatchType::Exact,
            });
        }

        // Aliases second. A later alias overwrites an earlier alias for the
        // same key but never displaces a canonical key.
        for (i, entry) in snapshot.entries.iter().enumerate() {
            for alias in &entry.aliases {
                let key = index_key(alias);
                match by_key.get(&key) {
                    Some(&slot) if slots[slot].match_type == MatchType::Exact => {}
                    Some(&slot) => slots[slot].entry = i,
                    None => {
                        by_key.insert(key.clone(), slots.len());
                        slots.push(IndexSlot {
                            key,
                            entry: i,
                            match_type: MatchType::Alias,
                        });
                    }
                }
            }
        }

        Self {
            snapshot,
            slots,
            by_key,
        }
    }

    /// Exact lookup by normalized key.
    fn lookup(&self, key: &str) -> Option<(&IndexSlot, u64, &str)> {
        self.by_key.get(key).map(|&i| {
            let slot = &self.slots[i];
            let entry = &self.snapshot.entries[slot.entry];
            (slot, entry.id, entry.canonical_name.as_str())
        })
    }

    /// Linear scan for a substring relation in either direction; the first
    /// hit in index insertion order wins. O(index size) per candidate, which
    /// is fine for the hundreds-to-low-thousands of entries this holds.
    fn substring_scan(&self, key: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|slot| slot.key.contains(key) || key.contains(slot.key.as_str()))
            .map(|slot| self.snapshot.entries[slot.entry].canonical_name.as_str())
    }
}

/// Partition clusters into new / existing / ambiguous / companies.
///
/// Every cluster lands in exactly one bucket; bucket-internal order follows
/// the input cluster order.
pub fn classify(clusters: Vec<Cluster>, snapshot: &KnowledgeBaseSnapshot) -> ClassificationResult {
    let index = NormalizedIndex::build(snapshot);
    let companies: Vec<String> = COMPANY_ENTITIES.iter().map(|c| index_key(c)).collect();

    let mut result = ClassificationResult::default();

    for cluster in clusters {
        let key = index_key(&cluster.name);

        if companies.contains(&key) {
            result.companies.push(CompanyMention { cluster });
            continue;
        }

        if let Some((slot, entry_id, canonical)) = index.lookup(&key) {
            result.existing_products.push(ExistingProduct {
                canonical_name: canonical.to_string(),
                entry_id,
                match_type: slot.match_type,
                cluster,
            });
            continue;
        }

        if let Some(canonical) = index.substring_scan(&key) {
            result.ambiguous.push(AmbiguousProduct {
                possible_match: canonical.to_string(),
                cluster,
            });
            continue;
        }

        result.new_products.push(NewProduct { cluster });
    }

    result
}
