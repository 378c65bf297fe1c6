//! rollscan command-line interface.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rollscan::{
    ExportFormat, PopplerRasterizer, ResultCache, SearchConfig, TesseractEngine,
    discover_documents, export_results, load_target_names, process_documents,
};

const EXIT_FAILURE: i32 = 1;
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(
    name = "rollscan",
    about = "Fuzzy name search over scanned electoral-roll PDFs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search a directory of PDFs for the given target names
    Search {
        /// Directory scanned recursively for *.pdf files
        directory: PathBuf,

        /// File with one target name per line (UTF-8)
        #[arg(short = 'n', long)]
        names_file: PathBuf,

        /// Fuzzy match threshold, 0-100
        #[arg(short = 't', long)]
        threshold: Option<u32>,

        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,

        /// Write results to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export format: json, csv, or auto (by extension)
        #[arg(short, long, default_value = "auto")]
        format: String,

        /// Config file; defaults to ./rollscan.toml when present
        #[arg(long)]
        config: Option<PathBuf>,

        /// Process documents in parallel (default)
        #[arg(long, overrides_with = "no_parallel")]
        parallel: bool,

        /// Process documents one at a time
        #[arg(long)]
        no_parallel: bool,

        /// Worker count; defaults to CPU count minus one
        #[arg(short, long)]
        workers: Option<usize>,

        /// Use the result cache (default)
        #[arg(long, overrides_with = "no_cache")]
        cache: bool,

        /// Bypass the result cache
        #[arg(long)]
        no_cache: bool,

        /// Cache directory; defaults to ~/.rollscan-cache
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Delete all cache entries before searching
        #[arg(long)]
        clear_cache: bool,

        /// Attach bounding boxes and confidences via word-level OCR
        #[arg(long)]
        box_level: bool,

        /// Minimum record confidence in box-level mode
        #[arg(long)]
        min_confidence: Option<f64>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match run_search(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rollscan={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_search(command: Command) -> anyhow::Result<i32> {
    let Command::Search {
        directory,
        names_file,
        threshold,
        verbose,
        output,
        format,
        config: config_path,
        parallel: _,
        no_parallel,
        workers,
        cache: _,
        no_cache,
        cache_dir,
        clear_cache,
        box_level,
        min_confidence,
    } = command;

    init_tracing(verbose);

    let mut config = load_config(config_path.as_deref())?;
    if let Some(threshold) = threshold {
        config.threshold = threshold;
    }
    if no_cache {
        config.use_cache = false;
    }
    if let Some(dir) = cache_dir {
        config.cache_dir = Some(dir);
    }
    if no_parallel {
        config.max_workers = Some(1);
    } else if let Some(workers) = workers {
        config.max_workers = Some(workers);
    }
    if box_level {
        config.box_level = true;
    }
    if let Some(min_confidence) = min_confidence {
        config.min_confidence = min_confidence;
    }
    config.validate().context("invalid configuration")?;
    tracing::debug!(?config, "resolved configuration");

    let format: ExportFormat = format.parse().context("invalid --format")?;

    if clear_cache {
        let cache = ResultCache::new(config.cache_dir.clone(), config.cache_ttl_days)
            .context("failed to open cache")?;
        let removed = cache.clear();
        println!("Cleared {} cache entries", removed);
    }

    let targets = load_target_names(
        &names_file,
        config.max_names_file_size_mb,
        config.max_target_names,
    )
    .context("failed to load target names")?;
    println!("Searching for {} names (threshold {})", targets.len(), config.threshold);

    let documents = discover_documents(&directory).context("document discovery failed")?;
    if documents.is_empty() {
        println!("No PDF documents found under {}", directory.display());
        return Ok(0);
    }
    println!("Found {} documents", documents.len());

    let interrupt = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&interrupt);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupt received, finishing in-flight documents...");
            handler_flag.store(true, Ordering::SeqCst);
        }
    });

    let cache_enabled = config.use_cache;
    let stats_cache_dir = config.cache_dir.clone();
    let stats_cache_ttl = config.cache_ttl_days;

    let rasterizer = Arc::new(PopplerRasterizer::new(config.max_document_pages));
    let engine = Arc::new(TesseractEngine::new(
        config.ocr_language.clone(),
        config.psm,
        config.page_timeout_secs,
    ));

    let outcome = process_documents(documents, targets, config, rasterizer, engine, interrupt)
        .await
        .context("batch processing failed")?;

    print_results(&outcome.results);
    print_stats(&outcome.stats);
    if cache_enabled {
        print_cache_stats(stats_cache_dir, stats_cache_ttl);
    }

    if let Some(output_path) = output {
        export_results(&outcome.results, &output_path, format)
            .context("failed to export results")?;
        println!("Results written to {}", output_path.display());
    }

    if outcome.interrupted {
        return Ok(EXIT_INTERRUPTED);
    }
    Ok(0)
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<SearchConfig> {
    match path {
        Some(path) => SearchConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => {
            let default_path = std::path::Path::new("rollscan.toml");
            if default_path.exists() {
                SearchConfig::from_toml_file(default_path).context("failed to load rollscan.toml")
            } else {
                Ok(SearchConfig::from_env())
            }
        }
    }
}

fn print_results(results: &[rollscan::SearchResult]) {
    if results.is_empty() {
        println!("\nNo matches found");
        return;
    }

    println!("\nMatches:");
    for result in results {
        let mut line = format!(
            "  {} page {}: {} (guardian: {})",
            result.file, result.page, result.name, result.father
        );
        if let Some(confidence) = result.confidence {
            line.push_str(&format!(" [confidence {:.1}]", confidence));
        }
        if let Some(bbox) = result.bbox {
            line.push_str(&format!(
                " @ ({}, {}) {}x{}",
                bbox.left, bbox.top, bbox.width, bbox.height
            ));
        }
        println!("{}", line);
    }
}

fn print_stats(stats: &rollscan::ProcessingStats) {
    println!(
        "\nProcessed {} files ({} failed), {} pages, {} matches",
        stats.files_processed, stats.files_failed, stats.pages_processed, stats.matches_found
    );
    if !stats.errors.is_empty() {
        println!("Errors:");
        for error in stats.errors.iter().take(5) {
            println!("  {}", error);
        }
        if stats.errors.len() > 5 {
            println!("  ... and {} more", stats.errors.len() - 5);
        }
    }
}

fn print_cache_stats(cache_dir: Option<PathBuf>, ttl_days: u64) {
    match ResultCache::new(cache_dir, ttl_days) {
        Ok(cache) => println!("{}", format_cache_stats(&cache.stats())),
        Err(e) => tracing::warn!(error = %e, "failed to read cache statistics"),
    }
}

fn format_cache_stats(report: &rollscan::CacheStatsReport) -> String {
    format!(
        "Cache: {} entries, {:.1} MB at {} (TTL {} days)",
        report.entry_count,
        report.total_size_bytes as f64 / (1024.0 * 1024.0),
        report.location.display(),
        report.ttl_days
    )
}
