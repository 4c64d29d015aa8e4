// Knowledge-base versioner - pure append of accepted entries.
//
// commit() never touches the parent snapshot; it builds a child value with
// monotonically allocated ids. Whether the child becomes durable is the
// store's job (atomic publish).

use chrono::{DateTime, Utc};
use tracing::warn;

use super::matcher::index_key;
use super::models::{ChangeSummary, KnowledgeBaseEntry, KnowledgeBaseSnapshot, ProposedEntry};

/// Outcome of a commit: the resulting snapshot plus what was accepted and
/// what was rejected as a duplicate.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub snapshot: KnowledgeBaseSnapshot,
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
}

impl CommitOutcome {
    /// True when a new version was actually produced.
    pub fn created_version(&self, parent: &KnowledgeBaseSnapshot) -> bool {
        self.snapshot.version_id != parent.version_id
    }

    pub fn change_summary(&self, parent: &KnowledgeBaseSnapshot) -> ChangeSummary {
        ChangeSummary {
            added_count: self.accepted.len(),
            original_count: parent.entries.len(),
            new_count: self.snapshot.entries.len(),
        }
    }
}

/// Append proposed entries to a snapshot, producing a child snapshot.
///
/// Ids are allocated from `max(existing ids) + 1`, strictly increasing.
/// A proposed entry whose canonical name collides with an existing
/// canonical name or alias - or with an entry accepted earlier in the same
/// batch - is rejected and logged, not fatal. If nothing is accepted the
/// parent snapshot is returned unchanged and no version id is consumed.
pub fn commit(
    parent: &KnowledgeBaseSnapshot,
    proposed: Vec<ProposedEntry>,
    now: DateTime<Utc>,
) -> CommitOutcome {
    if proposed.is_empty() {
        return CommitOutcome {
            snapshot: parent.clone(),
            accepted: Vec::new(),
            rejected: Vec::new(),
        };
    }

    // Every key already spoken for: canonical names and aliases of the
    // parent, extended with each accepted entry as the batch progresses.
    let mut taken: Vec<String> = Vec::new();
    for entry in &parent.entries {
        taken.push(index_key(&entry.canonical_name));
        for alias in &entry.aliases {
            taken.push(index_key(alias));
        }
    }

    let mut next_id = parent.max_id() + 1;
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    let mut new_entries = Vec::new();

    for entry in proposed {
        let key = index_key(&entry.canonical_name);
        if taken.contains(&key) {
            warn!(
                name = entry.canonical_name,
                "Duplicate canonical name, excluding from commit"
            );
            rejected.push(entry.canonical_name);
            continue;
        }

        taken.push(key);
        for alias in &entry.aliases {
            taken.push(index_key(alias));
        }

        accepted.push(entry.canonical_name.clone());
        new_entries.push(KnowledgeBaseEntry {
            id: next_id,
            canonical_name: entry.canonical_name,
            aliases: entry.aliases,
            company: entry.company,
            category: entry.category,
            mention_count: entry.mention_count,
            first_seen_at: entry.first_seen_at,
            confidence: entry.confidence,
        });
        next_id += 1;
    }

    if new_entries.is_empty() {
        return CommitOutcome {
            snapshot: parent.clone(),
            accepted,
            rejected,
        };
    }

    let mut entries = parent.entries.clone();
    entries.extend(new_entries);

    let snapshot = KnowledgeBaseSnapshot {
        version_id: next_version_id(parent, now),
        parent_version_id: if parent.is_empty_version() {
            None
        } else {
            Some(parent.version_id.clone())
        },
        entries,
        created_at: now.to_rfc3339(),
    };

    CommitOutcome {
        snapshot,
        accepted,
        rejected,
    }
}

/// Child version id: the parent's sequence number plus one, stamped with
/// the commit date ("v3-20260806").
fn next_version_id(parent: &KnowledgeBaseSnapshot, now: DateTime<Utc>) -> String {
    let seq = parent
        .version_id
        .strip_prefix('v')
        .and_then(|rest| rest.split('-').next())
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or(0);
    format!("v{}-{}", seq + 1, now.format("%Y%m%d"))
}
