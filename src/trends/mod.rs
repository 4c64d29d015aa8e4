// Weekly trends digest - TF-IDF keywords and a sentiment tally.
//
// Complements the per-product classification with a view of what the
// window was talking about overall. Each post is one document for IDF, so
// words every post uses get downweighted and distinctive ones surface.

use anyhow::Result;
use keyword_extraction::tf_idf::{TfIdf, TfIdfParams};
use serde::Serialize;
use stop_words::{get, LANGUAGE};
use tracing::info;

use crate::posts::Post;

const POSITIVE_WORDS: [&str; 8] = [
    "love",
    "amazing",
    "great",
    "awesome",
    "excellent",
    "fantastic",
    "incredible",
    "best",
];

const NEGATIVE_WORDS: [&str; 8] = [
    "hate",
    "terrible",
    "awful",
    "bad",
    "poor",
    "disappointed",
    "worst",
    "sucks",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Word-list sentiment: whichever polarity has more hits wins.
pub fn sentiment_of(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let pos = POSITIVE_WORDS.iter().filter(|w| lower.contains(**w)).count();
    let neg = NEGATIVE_WORDS.iter().filter(|w| lower.contains(**w)).count();
    match pos.cmp(&neg) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SentimentTally {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

/// A group of co-occurring keywords.
#[derive(Debug, Clone, Serialize)]
pub struct TopicGroup {
    pub label: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendDigest {
    pub topics: Vec<TopicGroup>,
    pub sentiment: SentimentTally,
    pub post_count: usize,
}

/// Build the digest for a post window.
pub fn digest(posts: &[Post], top_n_keywords: usize, max_topics: usize) -> Result<TrendDigest> {
    if posts.is_empty() {
        anyhow::bail!("No posts to analyze - cannot build a trends digest");
    }

    let texts: Vec<String> = posts.iter().map(|p| p.text.clone()).collect();
    let stop_words: Vec<String> = get(LANGUAGE::English);

    let params = TfIdfParams::UnprocessedDocuments(&texts, &stop_words, None);
    let tfidf = TfIdf::new(params);
    let ranked: Vec<(String, f32)> = tfidf.get_ranked_word_scores(top_n_keywords);

    if ranked.is_empty() {
        anyhow::bail!(
            "TF-IDF produced no keywords from {} posts - posts may be too short or uniform",
            posts.len()
        );
    }

    info!(
        keywords = ranked.len(),
        top_keyword = &ranked[0].0,
        "Extracted trend keywords"
    );

    let topics = group_keywords(&ranked, &texts, max_topics);

    let mut sentiment = SentimentTally::default();
    for post in posts {
        match sentiment_of(&post.text) {
            Sentiment::Positive => sentiment.positive += 1,
            Sentiment::Negative => sentiment.negative += 1,
            Sentiment::Neutral => sentiment.neutral += 1,
        }
    }

    Ok(TrendDigest {
        topics,
        sentiment,
        post_count: posts.len(),
    })
}

/// Greedy co-occurrence grouping: seed with the highest-ranked unassigned
/// keyword, pull in the keywords that most often share a post with it.
fn group_keywords(
    ranked: &[(String, f32)],
    texts: &[String],
    max_topics: usize,
) -> Vec<TopicGroup> {
    let keywords: Vec<&str> = ranked.iter().map(|(w, _)| w.as_str()).collect();
    let n = keywords.len();

    // Which keywords appear in each post.
    let post_keywords: Vec<Vec<usize>> = texts
        .iter()
        .map(|text| {
            let lower = text.to_lowercase();
            keywords
                .iter()
                .enumerate()
                .filter(|(_, kw)| lower.contains(*kw))
                .map(|(i, _)| i)
                .collect()
        })
        .collect();

    let mut cooccurrence = vec![vec![0u32; n]; n];
    for pk in &post_keywords {
        for &i in pk {
            for &j in pk {
                if i != j {
                    cooccurrence[i][j] += 1;
                }
            }
        }
    }

    let mut assigned = vec![false; n];
    let mut topics = Vec::new();

    for seed in 0..n {
        if topics.len() >= max_topics {
            break;
        }
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;

        let mut members = vec![seed];
        let mut related: Vec<(usize, u32)> = (0..n)
            .filter(|&i| !assigned[i] && cooccurrence[seed][i] > 0)
            .map(|i| (i, cooccurrence[seed][i]))
            .collect();
        related.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        for (i, _) in related.into_iter().take(4) {
            assigned[i] = true;
            members.push(i);
        }

        let group_keywords: Vec<String> =
            members.iter().map(|&i| ranked[i].0.clone()).collect();
        let label = group_keywords
            .iter()
            .take(3)
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" / ");

        topics.push(TopicGroup {
            label,
            keywords: group_keywords,
        });
    }

    topics
}
