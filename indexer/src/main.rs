use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scenes_core::corpus::load_corpus;
use scenes_core::{InvertedIndex, Scene};
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

mod report;

use report::{collection_stats, write_reports, ReportPlan};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a positional index over play scenes and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one query and print the ids of matching scenes
    Query {
        /// Corpus path (JSON/JSONL file or directory)
        #[arg(long)]
        corpus: String,
        /// Require the terms to appear as a contiguous phrase
        #[arg(long, default_value_t = false)]
        phrase: bool,
        /// Query terms
        #[arg(required = true)]
        terms: Vec<String>,
    },
    /// Run the report suite and write result files
    Report {
        /// Corpus path (JSON/JSONL file or directory)
        #[arg(long)]
        corpus: String,
        /// Output directory
        #[arg(long)]
        output: String,
        /// JSON report plan; defaults to the built-in query jobs
        #[arg(long)]
        plan: Option<String>,
    },
    /// Print collection statistics
    Stats {
        /// Corpus path (JSON/JSONL file or directory)
        #[arg(long)]
        corpus: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Query { corpus, phrase, terms } => run_query(&corpus, &terms.join(" "), phrase),
        Commands::Report { corpus, output, plan } => {
            let index = build_index(&corpus)?;
            let plan = match plan {
                Some(path) => ReportPlan::load(Path::new(&path))?,
                None => ReportPlan::default(),
            };
            write_reports(&index, &plan, Path::new(&output))?;
            Ok(())
        }
        Commands::Stats { corpus } => {
            let index = build_index(&corpus)?;
            let stats = collection_stats(&index);
            println!("scenes: {}", stats.num_scenes);
            println!("terms: {}", stats.num_terms);
            if let Some((scene_id, len)) = stats.shortest {
                println!("shortest scene: {scene_id} ({len} chars)");
            }
            println!("average scene length: {:.2}", stats.average_len);
            Ok(())
        }
    }
}

fn build_index(corpus: &str) -> Result<InvertedIndex<Scene>> {
    let scenes = load_corpus(corpus).with_context(|| format!("loading corpus {corpus}"))?;
    let mut index = InvertedIndex::new();
    index.build(scenes).with_context(|| format!("indexing corpus {corpus}"))?;
    Ok(index)
}

fn run_query(corpus: &str, query: &str, phrase: bool) -> Result<()> {
    let index = build_index(corpus)?;
    for id in matching_scene_ids(&index, query, phrase) {
        println!("{id}");
    }
    Ok(())
}

/// Sorted scene ids hit by `query`.
fn matching_scene_ids<'a>(index: &'a InvertedIndex<Scene>, query: &str, phrase: bool) -> Vec<&'a str> {
    let start = Instant::now();
    let hits = index.query(query, phrase);
    tracing::info!(query, phrase, hits = hits.len(), took_s = start.elapsed().as_secs_f64(), "query complete");

    let mut ids: Vec<&str> = hits.into_iter().map(|scene| scene.scene_id.as_str()).collect();
    ids.sort();
    ids
}
