//! CLI implementation for codepulse

mod config;
mod files;

use config::{apply_config_defaults, find_project_root};
use files::collect_input_files;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use codepulse::config::Config;
use codepulse::{Baseline, Identity, Normalizer, RunOptions, RunOutcome, RunReport};

#[derive(Parser)]
#[command(name = "codepulse")]
#[command(about = "Detect changed Python functions and report their callers")]
#[command(version)]
pub struct Cli {
    /// Python files or directories to analyze
    paths: Vec<PathBuf>,

    /// Baseline file (default: .codepulse/function_hashes.json in the project root)
    #[arg(long, env = "CODEPULSE_BASELINE")]
    baseline: Option<PathBuf>,

    /// Write the call-relation map to this file
    #[arg(long, env = "CODEPULSE_CALL_GRAPH")]
    call_graph: Option<PathBuf>,

    /// Baseline key mode: name, file
    #[arg(long)]
    identity: Option<Identity>,

    /// Record unparsable files and continue instead of stopping
    #[arg(long)]
    keep_going: bool,

    /// Drop baseline entries of functions that no longer exist
    #[arg(long)]
    prune: bool,

    /// Report changes without saving the baseline
    #[arg(long)]
    dry_run: bool,

    /// Only print protocol lines
    #[arg(short, long)]
    pub quiet: bool,

    /// Show debug info (sets RUST_LOG=debug)
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run CLI with pre-parsed arguments (used when main.rs needs to inspect args first)
pub fn run_with(mut cli: Cli) -> Result<()> {
    let root = find_project_root();
    // Load config and apply defaults (CLI flags override config)
    let config = Config::load(&root);
    apply_config_defaults(&mut cli, &config, &root);

    if cli.paths.is_empty() {
        println!("No input files provided.");
        return Ok(());
    }

    let files = collect_input_files(&cli.paths)?;
    tracing::info!(count = files.len(), "Collected input files");

    let baseline_path = cli
        .baseline
        .clone()
        .unwrap_or_else(|| config.baseline_or_default(&root));
    let baseline = Baseline::load(&baseline_path)
        .with_context(|| format!("Failed to load baseline {}", baseline_path.display()))?;

    let options = RunOptions {
        parser: config.parser(),
        normalizer: Normalizer::default().with_diagnostic_calls(config.diagnostic_calls.clone()),
        identity: cli.identity.unwrap_or_default(),
        keep_going: cli.keep_going,
        prune: cli.prune,
        ..Default::default()
    };

    let report = match codepulse::run(&files, baseline, &options)? {
        RunOutcome::Completed(report) => report,
        RunOutcome::Aborted(failure) => {
            // Baseline stays untouched so this run's changes are seen again
            tracing::error!("{}", failure.error);
            println!("SYNTAX_INVALID");
            return Ok(());
        }
    };

    persist(&cli, &report)?;
    report_results(&cli, &report)
}

/// Save the baseline and the call-relation map
fn persist(cli: &Cli, report: &RunReport) -> Result<()> {
    if cli.dry_run {
        tracing::info!("Dry run, baseline not saved");
        return Ok(());
    }
    report.baseline.save()?;
    if let Some(path) = &cli.call_graph {
        report
            .graph
            .save(path)
            .with_context(|| format!("Failed to write call graph {}", path.display()))?;
    }
    Ok(())
}

fn report_results(cli: &Cli, report: &RunReport) -> Result<()> {
    if !cli.quiet {
        eprintln!(
            "Analyzed {} files: {} changed, {} to re-check",
            report.files_analyzed,
            report.changes.len(),
            report.impact.len()
        );
        if !report.pruned.is_empty() {
            eprintln!("Pruned {} stale baseline entries", report.pruned.len());
        }
    }

    if !report.syntax_failures.is_empty() {
        let paths: Vec<String> = report
            .syntax_failures
            .iter()
            .map(|f| f.path.display().to_string())
            .collect();
        println!("UNPARSED_FILES: {}", serde_json::to_string(&paths)?);
    }

    if !report.impact.is_empty() {
        println!("NOTIFY_FUNCTIONS: {}", serde_json::to_string(&report.impact)?);
    }
    Ok(())
}
