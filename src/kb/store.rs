// Directory-per-version knowledge-base store.
//
// Layout under the root:
//
//   knowledge/
//     v1-20260801/
//       entries.json     {"total_entries": N, "entries": [...]}
//       metadata.json    {"version_id", "parent_version_id", "created_at",
//                         "change_summary": {...}}
//     v2-20260806/
//       ...
//
// A version directory, once written, is never modified in place. New
// versions are staged in a ".tmp-<id>" directory and published with a
// single rename, so readers either see a complete version or none at all.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::models::{ChangeSummary, KnowledgeBaseEntry, KnowledgeBaseSnapshot, ProposedEntry};
use super::versioner::{self, CommitOutcome};

const ENTRIES_FILE: &str = "entries.json";
const METADATA_FILE: &str = "metadata.json";
const TMP_PREFIX: &str = ".tmp-";

/// Knowledge-base storage failures. Commit failures are distinct from read
/// failures because they affect persistent state: a failed commit leaves
/// the parent version authoritative.
#[derive(Debug, Error)]
pub enum KbError {
    #[error("knowledge base version {0} not found")]
    VersionNotFound(String),

    #[error("knowledge base version {0} already exists")]
    VersionExists(String),

    #[error("knowledge base version {version} is malformed: {source}")]
    Corrupt {
        version: String,
        source: serde_json::Error,
    },

    #[error("failed to publish knowledge base version {version}: {source}")]
    CommitFailed {
        version: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionMetadata {
    pub version_id: String,
    pub parent_version_id: Option<String>,
    pub created_at: String,
    pub change_summary: ChangeSummary,
}

#[derive(Serialize, Deserialize)]
struct EntriesFile {
    total_entries: usize,
    entries: Vec<KnowledgeBaseEntry>,
}

/// Handle on a knowledge-base root directory.
pub struct VersionStore {
    root: PathBuf,
}

impl VersionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List version metadata, sorted by creation time then version id.
    /// A missing root is an empty knowledge base, not an error.
    pub fn list(&self) -> Result<Vec<VersionMetadata>, KbError> {
        let read_dir = match fs::read_dir(&self.root) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut versions = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            let name = dir_entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') || !dir_entry.path().is_dir() {
                continue;
            }
            let metadata_path = dir_entry.path().join(METADATA_FILE);
            if !metadata_path.exists() {
                warn!(version = name, "Version directory without metadata, skipping");
                continue;
            }
            let raw = fs::read_to_string(&metadata_path)?;
            let metadata: VersionMetadata =
                serde_json::from_str(&raw).map_err(|source| KbError::Corrupt {
                    version: name.clone(),
                    source,
                })?;
            versions.push(metadata);
        }

        versions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.version_id.cmp(&b.version_id))
        });
        Ok(versions)
    }

    /// Load one named version read-only.
    pub fn load(&self, version_id: &str) -> Result<KnowledgeBaseSnapshot, KbError> {
        let dir = self.root.join(version_id);
        if !dir.is_dir() {
            return Err(KbError::VersionNotFound(version_id.to_string()));
        }

        let metadata_raw = fs::read_to_string(dir.join(METADATA_FILE))?;
        let metadata: VersionMetadata =
            serde_json::from_str(&metadata_raw).map_err(|source| KbError::Corrupt {
                version: version_id.to_string(),
                source,
            })?;

        let entries_raw = fs::read_to_string(dir.join(ENTRIES_FILE))?;
        let entries: EntriesFile =
            serde_json::from_str(&entries_raw).map_err(|source| KbError::Corrupt {
                version: version_id.to_string(),
                source,
            })?;

        Ok(KnowledgeBaseSnapshot {
            version_id: metadata.version_id,
            parent_version_id: metadata.parent_version_id,
            entries: entries.entries,
            created_at: metadata.created_at,
        })
    }

    /// Resolve the current head version: the version no other version names
    /// as its parent. When lineages have diverged, the newest created_at
    /// wins (version id as the final tie-break). An empty store yields the
    /// empty snapshot - a missing knowledge base is not a fatal condition.
    pub fn current(&self) -> Result<KnowledgeBaseSnapshot, KbError> {
        let versions = self.list()?;
        if versions.is_empty() {
            return Ok(KnowledgeBaseSnapshot::empty());
        }

        let parents: Vec<&str> = versions
            .iter()
            .filter_map(|v| v.parent_version_id.as_deref())
            .collect();

        // `list` sorts ascending, so the last head is the newest.
        let head = versions
            .iter()
            .filter(|v| !parents.contains(&v.version_id.as_str()))
            .next_back()
            // Every version is someone's parent only in a cycle, which the
            // append-only format cannot produce; fall back to newest anyway.
            .unwrap_or_else(|| versions.last().expect("versions is non-empty"));

        self.load(&head.version_id)
    }

    /// Durably record a snapshot as a new version directory.
    ///
    /// All-or-nothing: the version is staged under a dot-prefixed temp
    /// directory (invisible to `list`) and published with one rename. On
    /// any failure the temp directory is cleaned up and no new version is
    /// visible.
    pub fn publish(
        &self,
        snapshot: &KnowledgeBaseSnapshot,
        change_summary: ChangeSummary,
    ) -> Result<(), KbError> {
        let version_id = snapshot.version_id.clone();
        if snapshot.is_empty_version() {
            return Err(KbError::CommitFailed {
                version: version_id,
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "the empty snapshot cannot be published",
                ),
            });
        }

        let final_dir = self.root.join(&version_id);
        if final_dir.exists() {
            return Err(KbError::VersionExists(version_id));
        }

        let tmp_dir = self.root.join(format!("{TMP_PREFIX}{version_id}"));
        let result = self.stage_and_rename(snapshot, change_summary, &tmp_dir, &final_dir);
        if result.is_err() {
            // Best-effort cleanup; the failed attempt must not leave a
            // visible version either way.
            let _ = fs::remove_dir_all(&tmp_dir);
        }
        result.map_err(|source| KbError::CommitFailed {
            version: snapshot.version_id.clone(),
            source,
        })
    }

    fn stage_and_rename(
        &self,
        snapshot: &KnowledgeBaseSnapshot,
        change_summary: ChangeSummary,
        tmp_dir: &Path,
        final_dir: &Path,
    ) -> Result<(), std::io::Error> {
        fs::create_dir_all(&self.root)?;
        if tmp_dir.exists() {
            // Leftover from a crashed attempt.
            fs::remove_dir_all(tmp_dir)?;
        }
        fs::create_dir(tmp_dir)?;

        let entries = EntriesFile {
            total_entries: snapshot.entries.len(),
            entries: snapshot.entries.clone(),
        };
        let metadata = VersionMetadata {
            version_id: snapshot.version_id.clone(),
            parent_version_id: snapshot.parent_version_id.clone(),
            created_at: snapshot.created_at.clone(),
            change_summary,
        };

        fs::write(
            tmp_dir.join(ENTRIES_FILE),
            serde_json::to_string_pretty(&entries).expect("entries serialize"),
        )?;
        fs::write(
            tmp_dir.join(METADATA_FILE),
            serde_json::to_string_pretty(&metadata).expect("metadata serialize"),
        )?;

        fs::rename(tmp_dir, final_dir)
    }

    /// Append accepted entries to `parent` and publish the child version.
    ///
    /// Duplicate canonical names are excluded per-entry (versioner). When
    /// nothing is accepted, no version is written and the parent outcome is
    /// returned unchanged.
    pub fn commit(
        &self,
        parent: &KnowledgeBaseSnapshot,
        proposed: Vec<ProposedEntry>,
        now: DateTime<Utc>,
    ) -> Result<CommitOutcome, KbError> {
        let outcome = versioner::commit(parent, proposed, now);
        if outcome.created_version(parent) {
            self.publish(&outcome.snapshot, outcome.change_summary(parent))?;
            info!(
                version = outcome.snapshot.version_id,
                added = outcome.accepted.len(),
                rejected = outcome.rejected.len(),
                "Published knowledge base version"
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, day, 12, 0, 0).unwrap()
    }

    fn proposed(name: &str) -> ProposedEntry {
        ProposedEntry {
            canonical_name: name.to_string(),
            aliases: vec![],
            company: None,
            category: Some("launch".to_string()),
            mention_count: 1,
            first_seen_at: "2026-08-01T00:00:00Z".to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_missing_root_is_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = VersionStore::new(dir.path().join("does-not-exist"));
        let snapshot = store.current().unwrap();
        assert!(snapshot.is_empty_version());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_commit_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = VersionStore::new(dir.path());

        let parent = store.current().unwrap();
        let outcome = store
            .commit(&parent, vec![proposed("Cursor"), proposed("Windsurf")], at(1))
            .unwrap();

        let loaded = store.load(&outcome.snapshot.version_id).unwrap();
        assert_eq!(loaded, outcome.snapshot);
        assert_eq!(loaded.entries.len(), 2);
    }

    #[test]
    fn test_current_resolves_child_after_commit() {
        let dir = tempfile::tempdir().unwrap();
        let store = VersionStore::new(dir.path());

        let v1 = store
            .commit(&KnowledgeBaseSnapshot::empty(), vec![proposed("Cursor")], at(1))
            .unwrap()
            .snapshot;
        let v2 = store
            .commit(&v1, vec![proposed("Windsurf")], at(6))
            .unwrap()
            .snapshot;

        let current = store.current().unwrap();
        assert_eq!(current.version_id, v2.version_id);
        assert_eq!(current.parent_version_id.as_deref(), Some(v1.version_id.as_str()));
    }

    #[test]
    fn test_parent_version_on_disk_is_unchanged_by_commit() {
        let dir = tempfile::tempdir().unwrap();
        let store = VersionStore::new(dir.path());

        let v1 = store
            .commit(&KnowledgeBaseSnapshot::empty(), vec![proposed("Cursor")], at(1))
            .unwrap()
            .snapshot;
        let before = store.load(&v1.version_id).unwrap();

        store.commit(&v1, vec![proposed("Windsurf")], at(6)).unwrap();

        let after = store.load(&v1.version_id).unwrap();
        assert_eq!(before, after, "published versions must never change");
    }

    #[test]
    fn test_empty_commit_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = VersionStore::new(dir.path());

        let outcome = store
            .commit(&KnowledgeBaseSnapshot::empty(), vec![], at(1))
            .unwrap();
        assert!(outcome.snapshot.is_empty_version());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_publish_refuses_existing_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = VersionStore::new(dir.path());

        let v1 = store
            .commit(&KnowledgeBaseSnapshot::empty(), vec![proposed("Cursor")], at(1))
            .unwrap()
            .snapshot;

        let summary = ChangeSummary {
            added_count: 0,
            original_count: 1,
            new_count: 1,
        };
        match store.publish(&v1, summary) {
            Err(KbError::VersionExists(id)) => assert_eq!(id, v1.version_id),
            other => panic!("expected VersionExists, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_publish_leaves_no_version_visible() {
        let dir = tempfile::tempdir().unwrap();
        // A root that is a file, not a directory - staging must fail.
        let root = dir.path().join("kb");
        fs::write(&root, "not a directory").unwrap();
        let store = VersionStore::new(&root);

        let result = store.commit(
            &KnowledgeBaseSnapshot::empty(),
            vec![proposed("Cursor")],
            at(1),
        );
        assert!(matches!(result, Err(KbError::CommitFailed { .. })));
    }

    #[test]
    fn test_temp_directories_are_invisible() {
        let dir = tempfile::tempdir().unwrap();
        let store = VersionStore::new(dir.path());
        fs::create_dir_all(dir.path().join(".tmp-v9-20260806")).unwrap();

        assert!(store.list().unwrap().is_empty());
        assert!(store.current().unwrap().is_empty_version());
    }

    #[test]
    fn test_corrupt_metadata_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = VersionStore::new(dir.path());
        let bad = dir.path().join("v1-20260801");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join(METADATA_FILE), "{ not json").unwrap();

        assert!(matches!(store.list(), Err(KbError::Corrupt { .. })));
    }

    #[test]
    fn test_diverged_lineages_prefer_newest() {
        let dir = tempfile::tempdir().unwrap();
        let store = VersionStore::new(dir.path());

        let v1 = store
            .commit(&KnowledgeBaseSnapshot::empty(), vec![proposed("Cursor")], at(1))
            .unwrap()
            .snapshot;
        // Two children of the same parent: distinct dates keep the version
        // ids distinct, and the newer one must win head resolution.
        let _a = store
            .commit(&v1, vec![proposed("Windsurf")], at(5))
            .unwrap()
            .snapshot;
        let b = store
            .commit(&v1, vec![proposed("Devin")], at(6))
            .unwrap()
            .snapshot;

        assert_eq!(store.current().unwrap().version_id, b.version_id);
    }
}
