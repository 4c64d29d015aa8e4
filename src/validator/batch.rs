// Batched validation with deterministic reassembly.
//
// Candidates are grouped by source post, posts are processed in fixed-size
// batches through a bounded worker pool, and results are put back into
// original post order before they reach the deduplicator - completion
// order must never leak into the output.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::extract::Candidate;
use crate::posts::Post;

use super::traits::{CandidateValidator, ValidatorVerdict};

/// Knobs for the batched validation pass.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Posts per batch.
    pub batch_size: usize,
    /// Concurrent validator calls within a batch.
    pub concurrency: usize,
    /// Validated products below this confidence are discarded.
    pub confidence_threshold: f64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 50,
            concurrency: 4,
            confidence_threshold: 0.6,
        }
    }
}

/// Run the validator over every post that produced candidates.
///
/// Returns the surviving candidates, in original post order. A post whose
/// validation fails (network error, malformed reply) just drops out of the
/// validated set with a warning - the batch always completes.
pub async fn validate_candidates(
    validator: &dyn CandidateValidator,
    posts: &[Post],
    candidates: Vec<Candidate>,
    options: BatchOptions,
) -> Vec<Candidate> {
    // Group candidates under their source post, keeping original post order.
    // Candidates whose post is not in the window have nothing to validate
    // against and drop out here.
    let mut by_post: HashMap<String, Vec<Candidate>> = HashMap::new();
    for candidate in candidates {
        by_post
            .entry(candidate.source_post_id.clone())
            .or_default()
            .push(candidate);
    }

    let groups: Vec<(&Post, Vec<Candidate>)> = posts
        .iter()
        .filter_map(|post| by_post.remove(&post.id).map(|c| (post, c)))
        .collect();

    if groups.is_empty() {
        return Vec::new();
    }

    info!(
        posts = groups.len(),
        batch_size = options.batch_size,
        "Validating candidates"
    );

    let pb = ProgressBar::new(groups.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Validating [{bar:30}] {pos}/{len} ({eta})")
            .unwrap(),
    );

    let mut validated = Vec::new();

    for batch in groups.chunks(options.batch_size) {
        // Fan the batch out over a bounded pool; tag each call with its
        // index so the results can be re-ordered afterwards.
        let mut results: Vec<(usize, &Post, &Vec<Candidate>, anyhow::Result<ValidatorVerdict>)> =
            stream::iter(batch.iter().enumerate().map(|(i, (post, group))| async move {
                let verdict = validator.validate_post(post, group).await;
                (i, *post, group, verdict)
            }))
            .buffer_unordered(options.concurrency)
            .collect()
            .await;
        results.sort_by_key(|(i, ..)| *i);

        for (_, post, group, verdict) in results {
            pb.inc(1);
            match verdict {
                Ok(verdict) => {
                    validated.extend(apply_verdict(post, group, &verdict, options));
                }
                Err(e) => {
                    // Local recovery: this post's candidates leave the
                    // validated set, the run continues.
                    warn!(post_id = post.id, error = %e, "Validation failed, dropping post's candidates");
                }
            }
        }
    }
    pb.finish_and_clear();

    validated
}

/// Turn a verdict into surviving candidates for one post.
///
/// The validator's name and confidence are authoritative; the signal
/// metadata is carried over from the matching original candidate (or the
/// group's first candidate when the validator renamed beyond recognition).
fn apply_verdict(
    post: &Post,
    group: &[Candidate],
    verdict: &ValidatorVerdict,
    options: BatchOptions,
) -> Vec<Candidate> {
    if !verdict.is_about_product {
        return Vec::new();
    }

    verdict
        .products
        .iter()
        .filter(|p| p.confidence >= options.confidence_threshold)
        .map(|product| {
            let origin = group
                .iter()
                .find(|c| {
                    crate::dedupe::normalize(&c.raw_name) == crate::dedupe::normalize(&product.name)
                })
                .or_else(|| group.first())
                .expect("group is never empty");

            Candidate {
                raw_name: product.name.clone(),
                source_post_id: post.id.clone(),
                signal_category: origin.signal_category,
                signal_phrase: origin.signal_phrase.clone(),
                confidence: product.confidence,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::Engagement;
    use crate::signals::lexicon::SignalCategory;
    use crate::validator::traits::ValidatedProduct;
    use anyhow::Result;
    use async_trait::async_trait;

    fn post(id: &str, text: &str) -> Post {
        Post {
            id: id.to_string(),
            text: text.to_string(),
            author: "tester".to_string(),
            created_at: "2026-08-01T00:00:00Z".to_string(),
            engagement: Engagement::default(),
            influencer_rank: 0,
            followers: 0,
        }
    }

    fn candidate(name: &str, post_id: &str) -> Candidate {
        Candidate {
            raw_name: name.to_string(),
            source_post_id: post_id.to_string(),
            signal_category: SignalCategory::Launch,
            signal_phrase: "just released".to_string(),
            confidence: 0.9,
        }
    }

    /// Confirms every candidate verbatim, erroring on configured post ids.
    struct ScriptedValidator {
        fail_on: Vec<String>,
        reject_on: Vec<String>,
    }

    #[async_trait]
    impl CandidateValidator for ScriptedValidator {
        async fn validate_post(
            &self,
            post: &Post,
            candidates: &[Candidate],
        ) -> Result<ValidatorVerdict> {
            if self.fail_on.contains(&post.id) {
                anyhow::bail!("scripted failure");
            }
            if self.reject_on.contains(&post.id) {
                return Ok(ValidatorVerdict {
                    is_about_product: false,
                    products: vec![],
                });
            }
            Ok(ValidatorVerdict {
                is_about_product: true,
                products: candidates
                    .iter()
                    .map(|c| ValidatedProduct {
                        name: c.raw_name.clone(),
                        product_type: Some("tool".to_string()),
                        is_new_release: true,
                        confidence: 0.9,
                        reasoning: String::new(),
                    })
                    .collect(),
            })
        }
    }

    #[tokio::test]
    async fn test_results_keep_original_post_order() {
        let posts: Vec<Post> = (0..10).map(|i| post(&format!("p{i}"), "text")).collect();
        let candidates: Vec<Candidate> = (0..10)
            .map(|i| candidate(&format!("Tool{i}"), &format!("p{i}")))
            .collect();

        let validator = ScriptedValidator {
            fail_on: vec![],
            reject_on: vec![],
        };
        let out = validate_candidates(
            &validator,
            &posts,
            candidates,
            BatchOptions {
                batch_size: 3,
                concurrency: 4,
                confidence_threshold: 0.6,
            },
        )
        .await;

        let names: Vec<&str> = out.iter().map(|c| c.raw_name.as_str()).collect();
        let expected: Vec<String> = (0..10).map(|i| format!("Tool{i}")).collect();
        assert_eq!(names, expected.iter().map(|s| s.as_str()).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_failed_post_is_dropped_but_batch_continues() {
        let posts = vec![post("p1", "a"), post("p2", "b"), post("p3", "c")];
        let candidates = vec![
            candidate("Cursor", "p1"),
            candidate("Windsurf", "p2"),
            candidate("Devin", "p3"),
        ];
        let validator = ScriptedValidator {
            fail_on: vec!["p2".to_string()],
            reject_on: vec![],
        };
        let out = validate_candidates(&validator, &posts, candidates, BatchOptions::default()).await;
        let names: Vec<&str> = out.iter().map(|c| c.raw_name.as_str()).collect();
        assert_eq!(names, vec!["Cursor", "Devin"]);
    }

    #[tokio::test]
    async fn test_reject_all_verdict_is_not_an_error() {
        let posts = vec![post("p1", "a")];
        let candidates = vec![candidate("Cursor", "p1")];
        let validator = ScriptedValidator {
            fail_on: vec![],
            reject_on: vec!["p1".to_string()],
        };
        let out = validate_candidates(&validator, &posts, candidates, BatchOptions::default()).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_low_confidence_products_filtered() {
        struct LowConfidence;
        #[async_trait]
        impl CandidateValidator for LowConfidence {
            async fn validate_post(
                &self,
                _post: &Post,
                candidates: &[Candidate],
            ) -> Result<ValidatorVerdict> {
                Ok(ValidatorVerdict {
                    is_about_product: true,
                    products: candidates
                        .iter()
                        .map(|c| ValidatedProduct {
                            name: c.raw_name.clone(),
                            product_type: None,
                            is_new_release: false,
                            confidence: 0.4,
                            reasoning: String::new(),
                        })
                        .collect(),
                })
            }
        }

        let posts = vec![post("p1", "a")];
        let candidates = vec![candidate("Cursor", "p1")];
        let out =
            validate_candidates(&LowConfidence, &posts, candidates, BatchOptions::default()).await;
        assert!(out.is_empty(), "0.4 < 0.6 threshold must be filtered");
    }

    #[tokio::test]
    async fn test_signal_metadata_carried_from_matching_candidate() {
        let posts = vec![post("p1", "a")];
        let candidates = vec![candidate("cursor", "p1")];
        let validator = ScriptedValidator {
            fail_on: vec![],
            reject_on: vec![],
        };
        let out = validate_candidates(&validator, &posts, candidates, BatchOptions::default()).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].signal_category, SignalCategory::Launch);
        assert_eq!(out[0].signal_phrase, "just released");
    }
}
