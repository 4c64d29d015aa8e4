// Fuzzy cluster merging.
//
// Pairwise string similarity over the already-distinct cluster names, with
// union-find so merges are transitive and independent of input order: if A
// merges with B and B with C, all three land in one cluster no matter how
// the pairs were visited.

use super::Cluster;

/// Similarity strictly above this merges two names.
pub const MERGE_THRESHOLD: f64 = 0.7;

/// A substring relation forces at least this similarity.
pub const SUBSTRING_FLOOR: f64 = 0.8;

/// Similarity ratio between two names: normalized edit distance on the
/// lowercase forms, with the substring floor applied.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let mut ratio = strsim::normalized_levenshtein(&a, &b);
    if a.contains(&b) || b.contains(&a) {
        ratio = ratio.max(SUBSTRING_FLOOR);
    }
    ratio
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, i: usize) -> usize {
        if self.parent[i] != i {
            let root = self.find(self.parent[i]);
            self.parent[i] = root;
        }
        self.parent[i]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Attach the larger root to the smaller so the group keeps its
            // earliest member as the root.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

/// Merge near-duplicate clusters.
///
/// Within a merged group the representative is the member with the highest
/// confidence (ties: first seen). Output order follows the first-seen order
/// of each group's earliest member.
pub fn merge_clusters(clusters: Vec<Cluster>) -> Vec<Cluster> {
    let n = clusters.len();
    if n < 2 {
        return clusters;
    }

    let mut uf = UnionFind::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if similarity(&clusters[i].name, &clusters[j].name) > MERGE_THRESHOLD {
                uf.union(i, j);
            }
        }
    }

    // Group member indices under their root; roots appear in first-seen order.
    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    for i in 0..n {
        let root = uf.find(i);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(i),
            None => groups.push((root, vec![i])),
        }
    }

    groups
        .into_iter()
        .map(|(_, members)| {
            let rep = members
                .iter()
                .copied()
                .max_by(|&a, &b| {
                    clusters[a]
                        .confidence
                        .partial_cmp(&clusters[b].confidence)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        // max_by keeps the last maximal element; invert the
                        // index order so ties resolve to the first seen.
                        .then_with(|| b.cmp(&a))
                })
                .expect("group is never empty");

            let mut merged = Cluster {
                name: clusters[rep].name.clone(),
                confidence: clusters[rep].confidence,
                supporting_posts: Vec::new(),
                signal_categories: Vec::new(),
            };
            for &i in &members {
                for post in &clusters[i].supporting_posts {
                    if !merged.supporting_posts.contains(post) {
                        merged.supporting_posts.push(post.clone());
                    }
                }
                merged
                    .signal_categories
                    .extend(clusters[i].signal_categories.iter().copied());
            }
            merged
        })
        .collect()
}
