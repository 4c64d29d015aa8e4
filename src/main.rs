use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use periscope::config::Config;
use periscope::kb::store::VersionStore;
use periscope::validator::batch::BatchOptions;
use periscope::validator::claude::ClaudeValidator;
use periscope::validator::traits::{CandidateValidator, NoopValidator};

/// Periscope: product launch radar for social media streams.
///
/// Extracts product mentions from a post window, classifies them against a
/// versioned knowledge base, and appends accepted new products as a new
/// immutable version.
#[derive(Parser)]
#[command(name = "periscope", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the knowledge base directory
    Init,

    /// Scan a post window and classify product mentions
    Scan {
        /// Path to the collector's posts export (JSON)
        posts: String,

        /// Validate candidates through the LLM before classification
        #[arg(long)]
        validate: bool,

        /// Commit accepted new products as a new knowledge base version
        #[arg(long)]
        commit: bool,
    },

    /// Show aggregate signal statistics for a post window
    Signals {
        /// Path to the collector's posts export (JSON)
        posts: String,
    },

    /// Show the keyword and sentiment digest for a post window
    Trends {
        /// Path to the collector's posts export (JSON)
        posts: String,

        /// Maximum topic groups to display (default: 10)
        #[arg(long, default_value = "10")]
        topics: u32,
    },

    /// List knowledge base versions
    Versions,

    /// Show system status (knowledge base location, head version)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("periscope=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let config = Config::load()?;
            std::fs::create_dir_all(&config.kb_dir)?;
            println!("Knowledge base initialized at: {}", config.kb_dir);
            println!("\nPeriscope is ready. Next step: export a post window, then run:");
            println!("  periscope scan <posts.json>");
        }

        Commands::Scan {
            posts,
            validate,
            commit,
        } => {
            let config = Config::load()?;
            let posts = periscope::posts::load_posts(Path::new(&posts))?;
            println!("Loaded {} posts", posts.len());

            let store = VersionStore::new(&config.kb_dir);
            let snapshot = store.current()?;
            if snapshot.is_empty_version() {
                println!("Knowledge base: empty (every product will classify as new)");
            } else {
                println!(
                    "Knowledge base: {} ({} entries)",
                    snapshot.version_id,
                    snapshot.entries.len()
                );
            }

            let validator: Box<dyn CandidateValidator> = if validate {
                config.require_validator()?;
                Box::new(ClaudeValidator::new(
                    &config.validator_url,
                    config.anthropic_api_key.clone(),
                    config.model.clone(),
                    config.validator_rps,
                ))
            } else {
                Box::new(NoopValidator)
            };

            let options = BatchOptions {
                batch_size: config.llm_batch_size,
                concurrency: config.llm_concurrency,
                confidence_threshold: config.validation_threshold,
            };

            let outcome =
                periscope::pipeline::scan::run(&posts, &snapshot, validator.as_ref(), validate, options)
                    .await?;

            periscope::output::terminal::display_classification(&outcome.result, &posts);

            let stats = outcome.stats;
            println!("{}", "Scan complete.".bold());
            println!(
                "  {} posts, {} with signals, {} candidates, {} clusters",
                stats.posts_scanned,
                stats.signaled_posts,
                stats.candidates_extracted,
                stats.clusters,
            );
            if validate {
                println!("  {} candidates survived validation", stats.candidates_validated);
            }

            if commit {
                let proposed =
                    periscope::pipeline::scan::proposed_entries(&outcome.result, &posts);
                if proposed.is_empty() {
                    println!("\nNo new products to commit.");
                } else {
                    let commit_outcome = store.commit(&snapshot, proposed, Utc::now())?;
                    for name in &commit_outcome.rejected {
                        println!(
                            "  {} {name} collides with an existing entry, skipped",
                            "Warning:".yellow()
                        );
                    }
                    if commit_outcome.created_version(&snapshot) {
                        info!(
                            version = commit_outcome.snapshot.version_id,
                            "Knowledge base updated"
                        );
                        println!(
                            "\n{} {} ({} products added)",
                            "Published".green().bold(),
                            commit_outcome.snapshot.version_id,
                            commit_outcome.accepted.len(),
                        );
                    } else {
                        println!("\nNothing accepted - knowledge base unchanged.");
                    }
                }
            }
        }

        Commands::Signals { posts } => {
            let posts = periscope::posts::load_posts(Path::new(&posts))?;
            let stats = periscope::signals::detector::signal_statistics(&posts);
            periscope::output::terminal::display_signal_stats(&stats, posts.len());
        }

        Commands::Trends { posts, topics } => {
            let posts = periscope::posts::load_posts(Path::new(&posts))?;
            let digest = periscope::trends::digest(&posts, 60, topics as usize)?;
            periscope::output::terminal::display_trends(&digest);
        }

        Commands::Versions => {
            let config = Config::load()?;
            let store = VersionStore::new(&config.kb_dir);
            let versions = store.list()?;
            periscope::output::terminal::display_versions(&versions);
        }

        Commands::Status => {
            let config = Config::load()?;
            if !Path::new(&config.kb_dir).exists() {
                println!("Knowledge base: not initialized ({})", config.kb_dir);
                println!("\nRun `periscope init` to set it up.");
                return Ok(());
            }

            let store = VersionStore::new(&config.kb_dir);
            let versions = store.list()?;
            let head = store.current()?;

            println!("Knowledge base: {}", config.kb_dir);
            if head.is_empty_version() {
                println!("Head version: none (empty knowledge base)");
            } else {
                println!(
                    "Head version: {} ({} entries, created {})",
                    head.version_id,
                    head.entries.len(),
                    head.created_at,
                );
            }
            println!("Versions on disk: {}", versions.len());
        }
    }

    Ok(())
}
