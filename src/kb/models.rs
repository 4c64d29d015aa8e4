// Knowledge-base data models.
//
// These are the types that flow between the matcher, versioner, and store.
// They're plain serde values so the store can persist them and other
// modules can use them without touching the filesystem layer.

use serde::{Deserialize, Serialize};

use crate::dedupe::Cluster;

/// Version id of the implicit empty snapshot (never persisted).
pub const EMPTY_VERSION: &str = "v0";

/// The unit of record in the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseEntry {
    pub id: u64,
    pub canonical_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub mention_count: u32,
    #[serde(default)]
    pub first_seen_at: String,
    #[serde(default)]
    pub confidence: f64,
}

/// One immutable, fully materialized version of the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseSnapshot {
    pub version_id: String,
    pub parent_version_id: Option<String>,
    pub entries: Vec<KnowledgeBaseEntry>,
    pub created_at: String,
}

impl KnowledgeBaseSnapshot {
    /// The empty snapshot - used when no version exists yet. Every cluster
    /// classifies as new against it.
    pub fn empty() -> Self {
        Self {
            version_id: EMPTY_VERSION.to_string(),
            parent_version_id: None,
            entries: Vec::new(),
            created_at: String::new(),
        }
    }

    pub fn is_empty_version(&self) -> bool {
        self.version_id == EMPTY_VERSION
    }

    pub fn max_id(&self) -> u64 {
        self.entries.iter().map(|e| e.id).max().unwrap_or(0)
    }
}

/// What changed between a snapshot and its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Entries appended by this version.
    pub added_count: usize,
    /// Entry count of the parent.
    pub original_count: usize,
    /// Entry count of this version.
    pub new_count: usize,
}

/// Which index key matched an existing product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Alias,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Alias => "alias",
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cluster the snapshot has never seen.
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub cluster: Cluster,
}

/// A cluster matching a known entry exactly or through an alias.
#[derive(Debug, Clone, Serialize)]
pub struct ExistingProduct {
    pub cluster: Cluster,
    pub canonical_name: String,
    pub entry_id: u64,
    pub match_type: MatchType,
}

/// A cluster that only substring-matches a known entry - needs human review.
#[derive(Debug, Clone, Serialize)]
pub struct AmbiguousProduct {
    pub cluster: Cluster,
    pub possible_match: String,
}

/// A cluster naming a company rather than a product.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyMention {
    pub cluster: Cluster,
}

/// Total, disjoint partition of a cluster batch against one snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationResult {
    pub new_products: Vec<NewProduct>,
    pub existing_products: Vec<ExistingProduct>,
    pub ambiguous: Vec<AmbiguousProduct>,
    pub companies: Vec<CompanyMention>,
}

impl ClassificationResult {
    /// Number of clusters across all buckets.
    pub fn total(&self) -> usize {
        self.new_products.len()
            + self.existing_products.len()
            + self.ambiguous.len()
            + self.companies.len()
    }
}

/// A proposed entry, before the versioner allocates its id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedEntry {
    pub canonical_name: String,
    pub aliases: Vec<String>,
    pub company: Option<String>,
    pub category: Option<String>,
    pub mention_count: u32,
    pub first_seen_at: String,
    pub confidence: f64,
}
