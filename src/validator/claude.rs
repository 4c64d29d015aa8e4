// Claude messages API validator.
//
// Sends the post text plus the extracted candidates to an Anthropic-style
// messages endpoint and expects a JSON verdict back. The model's reply is
// free text, so the JSON payload is carved out of it tolerantly (code
// fences and prose around the object are accepted); anything that still
// fails to parse is the caller's ValidatorResponseError case.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::Candidate;
use crate::posts::Post;

use super::rate_limiter::RateLimiter;
use super::traits::{CandidateValidator, ValidatorVerdict};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Validator backed by the Claude messages API.
pub struct ClaudeValidator {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    rate_limiter: RateLimiter,
}

impl ClaudeValidator {
    pub fn new(
        api_url: &str,
        api_key: String,
        model: String,
        requests_per_second: f64,
    ) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.to_string(),
            api_key,
            model,
            rate_limiter: RateLimiter::per_second(requests_per_second),
        }
    }
}

#[async_trait]
impl CandidateValidator for ClaudeValidator {
    async fn validate_post(
        &self,
        post: &Post,
        candidates: &[Candidate],
    ) -> Result<ValidatorVerdict> {
        // Respect the backend's throughput limit before every call.
        self.rate_limiter.acquire().await;

        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: build_validation_prompt(&post.text, candidates),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .context("Failed to call the validator API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Validator API returned {}: {}", status, body);
        }

        let result: MessagesResponse = response
            .json()
            .await
            .context("Failed to parse the validator API envelope")?;

        let text: String = result.content.iter().map(|b| b.text.as_str()).collect();
        let verdict = parse_verdict(&text)?;

        debug!(
            post_id = post.id,
            is_about_product = verdict.is_about_product,
            products = verdict.products.len(),
            "Validated post"
        );

        Ok(verdict)
    }
}

/// The prompt embeds the post and the candidate list with signal metadata;
/// the contract is a strict-JSON reply.
pub fn build_validation_prompt(post_text: &str, candidates: &[Candidate]) -> String {
    let candidate_list: String = candidates
        .iter()
        .map(|c| {
            format!(
                "- {} (signal: {:?}, category: {})\n",
                c.raw_name,
                c.signal_phrase,
                c.signal_category.as_str()
            )
        })
        .collect();

    format!(
        r#"You are an expert at identifying AI products. These product-name candidates were detected in a social media post; verify them.

POST:
"{post_text}"

CANDIDATES:
{candidate_list}
TASK:
1. Is this post actually discussing an AI product/model/tool?
2. If so, extract the accurate product names (there may be several).
3. Classify each product's type.
4. Judge whether each is a newly released product.

CRITERIA:
- Products: Claude, GPT-4, Midjourney, Cursor (specific AI products/models/tools)
- Not products: AI, ChatGPT (too generic), Google (company), OpenAI (company)
- Not products: person names, place names, generic vocabulary

Reply with exactly this JSON shape and nothing else:

{{
  "is_about_product": true,
  "products": [
    {{
      "name": "Accurate product name (capitalized)",
      "type": "model/tool/platform/other",
      "is_new_release": false,
      "confidence": 0.0,
      "reasoning": "short justification"
    }}
  ]
}}

If the post is not about a product, reply {{"is_about_product": false, "products": []}}.
Strip filler words from names (e.g. "the new"). Be honest with confidence - uncertain means low. Set is_new_release true only when the post explicitly says released/announced."#
    )
}

/// Pull the verdict JSON out of a model reply. The payload is taken from
/// the first opening brace to the last closing brace so code fences and
/// surrounding prose don't break parsing.
pub fn parse_verdict(reply: &str) -> Result<ValidatorVerdict> {
    let start = reply
        .find('{')
        .context("validator reply contains no JSON object")?;
    let end = reply
        .rfind('}')
        .context("validator reply contains no JSON object")?;
    if end < start {
        anyhow::bail!("validator reply contains no JSON object");
    }

    serde_json::from_str(&reply[start..=end]).context("validator reply is not a valid verdict")
}

// --- Messages API request/response types ---

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}
