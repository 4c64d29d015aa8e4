// Post model and the raw-export load boundary.
//
// The collector hands us a finite, ordered window of posts as a JSON file.
// Two export shapes exist in the wild: the full export with a metadata
// header ({"metadata": ..., "tweets": [...]}) and a bare array of posts.
// Shape detection happens once, here - the rest of the pipeline only ever
// sees `Post` values.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One social-media post, immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub author: String,
    /// RFC 3339 timestamp as exported by the collector.
    pub created_at: String,
    #[serde(default)]
    pub engagement: Engagement,
    /// Rank of the author in the collector's influencer list (0 = unranked).
    #[serde(default)]
    pub influencer_rank: u32,
    #[serde(default)]
    pub followers: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: u64,
    pub retweets: u64,
}

impl Engagement {
    /// Combined engagement weight used for ranking mentions.
    pub fn total(&self) -> u64 {
        self.likes + self.retweets
    }
}

/// Load a post window from a collector export file.
///
/// Accepts either the wrapped export shape or a bare array. Posts without
/// an id get a positional one so downstream supporting-post references
/// stay unambiguous within the run.
pub fn load_posts(path: &Path) -> Result<Vec<Post>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read posts file {}", path.display()))?;
    parse_export(&raw).with_context(|| format!("Failed to parse posts file {}", path.display()))
}

/// Parse an export payload into posts. Separated from `load_posts` so tests
/// can feed JSON directly.
pub fn parse_export(raw: &str) -> Result<Vec<Post>> {
    let export: RawExport = serde_json::from_str(raw)?;
    let raw_posts = match export {
        RawExport::Wrapped { tweets } => tweets,
        RawExport::Bare(posts) => posts,
    };

    let posts = raw_posts
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let id = if p.id.is_empty() {
                format!("post-{i}")
            } else {
                p.id
            };
            Post {
                id,
                text: p.text,
                author: p.author.into_name(),
                created_at: p.created_at,
                engagement: Engagement {
                    likes: p.likes,
                    retweets: p.retweets,
                },
                influencer_rank: p.rank,
                followers: p.followers,
            }
        })
        .collect();

    Ok(posts)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExport {
    Wrapped { tweets: Vec<RawPost> },
    Bare(Vec<RawPost>),
}

#[derive(Deserialize)]
struct RawPost {
    #[serde(default)]
    id: String,
    text: String,
    #[serde(default)]
    author: RawAuthor,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    retweets: u64,
    #[serde(default)]
    rank: u32,
    #[serde(default)]
    followers: u64,
}

/// The collector exported authors as a bare username in early windows and
/// as an object later.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAuthor {
    Name(String),
    Object {
        #[serde(default)]
        username: String,
    },
}

impl RawAuthor {
    fn into_name(self) -> String {
        match self {
            RawAuthor::Name(name) => name,
            RawAuthor::Object { username } => username,
        }
    }
}

impl Default for RawAuthor {
    fn default() -> Self {
        RawAuthor::Name(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_export() {
        let raw = r#"{
            "metadata": {"date_range": {"start": "2026-07-30", "end": "2026-08-06"}},
            "tweets": [
                {"id": "t1", "text": "hello", "author": {"username": "alice"},
                 "created_at": "2026-08-01T10:00:00Z", "likes": 3, "retweets": 1,
                 "rank": 12, "followers": 900}
            ]
        }"#;
        let posts = parse_export(raw).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "t1");
        assert_eq!(posts[0].author, "alice");
        assert_eq!(posts[0].engagement.total(), 4);
        assert_eq!(posts[0].influencer_rank, 12);
    }

    #[test]
    fn test_parse_bare_array_with_string_author() {
        let raw = r#"[{"text": "bare post", "author": "bob"}]"#;
        let posts = parse_export(raw).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "post-0");
        assert_eq!(posts[0].author, "bob");
        assert_eq!(posts[0].engagement.total(), 0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_export("not json").is_err());
        assert!(parse_export(r#"{"posts": 7}"#).is_err());
    }
}
