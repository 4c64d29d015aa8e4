// Colored terminal output for classification results and statistics.
//
// This module handles all terminal-specific formatting: colors, section
// headers, summary counters. The main.rs display paths delegate here.

use colored::Colorize;

use crate::dedupe::Cluster;
use crate::kb::models::ClassificationResult;
use crate::kb::store::VersionMetadata;
use crate::posts::Post;
use crate::signals::detector::SignalStatistics;
use crate::trends::TrendDigest;

/// Display a full classification result, bucket by bucket.
pub fn display_classification(result: &ClassificationResult, posts: &[Post]) {
    println!(
        "\n{}",
        format!("=== Classification ({} entities) ===", result.total()).bold()
    );

    if result.total() == 0 {
        println!("\nNo product mentions found in this window.");
        return;
    }

    if !result.new_products.is_empty() {
        println!(
            "\n{} {}",
            "New products".green().bold(),
            format!("({})", result.new_products.len()).dimmed()
        );
        for (i, product) in result.new_products.iter().enumerate() {
            print_cluster_line(i + 1, &product.cluster, posts);
            // One supporting post as evidence.
            if let Some(sample) = product
                .cluster
                .supporting_posts
                .first()
                .and_then(|id| posts.iter().find(|p| &p.id == id))
            {
                println!(
                    "       \"{}\"",
                    super::truncate_chars(&sample.text, 100).dimmed()
                );
            }
        }
    }

    if !result.existing_products.is_empty() {
        println!(
            "\n{} {}",
            "Known products".bold(),
            format!("({})", result.existing_products.len()).dimmed()
        );
        for (i, product) in result.existing_products.iter().enumerate() {
            println!(
                "  {:>3}. {:<28} -> {} {}",
                i + 1,
                product.cluster.name,
                product.canonical_name,
                format!("[{} match, entry #{}]", product.match_type, product.entry_id).dimmed(),
            );
        }
    }

    if !result.companies.is_empty() {
        println!(
            "\n{} {}",
            "Companies".bold(),
            format!("({})", result.companies.len()).dimmed()
        );
        for (i, company) in result.companies.iter().enumerate() {
            print_cluster_line(i + 1, &company.cluster, posts);
        }
    }

    if !result.ambiguous.is_empty() {
        println!(
            "\n{} {}",
            "Needs review".yellow().bold(),
            format!("({})", result.ambiguous.len()).dimmed()
        );
        for (i, product) in result.ambiguous.iter().enumerate() {
            println!(
                "  {:>3}. {:<28} {} {}",
                i + 1,
                product.cluster.name,
                "~".yellow(),
                format!("possibly {}", product.possible_match).dimmed(),
            );
        }
    }

    println!();
}

fn print_cluster_line(rank: usize, cluster: &Cluster, posts: &[Post]) {
    let engagement: u64 = cluster
        .supporting_posts
        .iter()
        .filter_map(|id| posts.iter().find(|p| &p.id == id))
        .map(|p| p.engagement.total())
        .sum();
    println!(
        "  {:>3}. {:<28} {} mentions, {} engagement, confidence {:.2}",
        rank,
        cluster.name,
        cluster.mention_count(),
        engagement,
        cluster.confidence,
    );
}

/// Display aggregate signal statistics for a post window.
pub fn display_signal_stats(stats: &SignalStatistics, total_posts: usize) {
    println!("\n{}", "=== Signal Statistics ===".bold());
    println!(
        "  Posts with signals: {} / {}",
        stats.signaled_posts, total_posts
    );

    if !stats.category_counts.is_empty() {
        println!("\n  {}", "By category".dimmed());
        for (category, count) in &stats.category_counts {
            println!("    {:<14} {}", category.as_str(), count);
        }
    }

    if !stats.signal_counts.is_empty() {
        println!("\n  {}", "Top phrases".dimmed());
        for (phrase, count) in stats.signal_counts.iter().take(10) {
            println!("    {:<20} {}", phrase, count);
        }
    }
    println!();
}

/// Display the weekly trends digest.
pub fn display_trends(digest: &TrendDigest) {
    println!(
        "\n{}",
        format!("=== Trends ({} posts) ===", digest.post_count).bold()
    );

    for (i, topic) in digest.topics.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, topic.label.bold());
        println!("      {}", topic.keywords.join(", ").dimmed());
    }

    let s = &digest.sentiment;
    println!(
        "\n  Sentiment: {} positive / {} negative / {} neutral",
        s.positive.to_string().green(),
        s.negative.to_string().red(),
        s.neutral,
    );
    println!();
}

/// Display the knowledge-base version lineage.
pub fn display_versions(versions: &[VersionMetadata]) {
    if versions.is_empty() {
        println!("No knowledge base versions yet. Run `periscope scan --commit` to create one.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Knowledge Base ({} versions) ===", versions.len()).bold()
    );
    for version in versions {
        let parent = version
            .parent_version_id
            .as_deref()
            .unwrap_or("(root)");
        println!(
            "  {:<16} <- {:<16} {} entries (+{}), created {}",
            version.version_id,
            parent,
            version.change_summary.new_count,
            version.change_summary.added_count,
            version.created_at.dimmed(),
        );
    }
    println!();
}
