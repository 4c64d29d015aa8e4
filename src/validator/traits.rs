// Candidate validator trait - the swap-ready abstraction.
//
// A validator looks at one post plus the candidates extracted from it and
// returns a verdict: whether the post discusses a product at all, and the
// corrected product list if it does. The default backend is the Claude
// messages API; the trait keeps the pipeline independent of that choice.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::extract::Candidate;
use crate::posts::Post;

/// One product confirmed by the validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedProduct {
    pub name: String,
    /// "model" / "tool" / "platform" / "other".
    #[serde(rename = "type", default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub is_new_release: bool,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// The validator's verdict for one post.
///
/// `is_about_product: false` is a valid reject-all outcome, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorVerdict {
    pub is_about_product: bool,
    #[serde(default)]
    pub products: Vec<ValidatedProduct>,
}

/// Trait for validating extracted candidates. Implementations are async
/// because real backends are HTTP services.
#[async_trait]
pub trait CandidateValidator: Send + Sync {
    /// Validate one post's candidates.
    async fn validate_post(&self, post: &Post, candidates: &[Candidate])
        -> Result<ValidatorVerdict>;
}

/// No-op validator used when validation is disabled. Errors if actually
/// called - ensures we don't silently fabricate verdicts.
pub struct NoopValidator;

#[async_trait]
impl CandidateValidator for NoopValidator {
    async fn validate_post(
        &self,
        _post: &Post,
        _candidates: &[Candidate],
    ) -> Result<ValidatorVerdict> {
        anyhow::bail!("NoopValidator should never be called - run without --validate")
    }
}
