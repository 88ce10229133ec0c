//! End-to-end change detection run
//!
//! Each file is analysed on its own (parse, normalize, hash, extract calls)
//! on the rayon pool. The results are then folded into a [`RunState`] one
//! file at a time, in input order, so a parallel run reports exactly what a
//! sequential run would.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;

use crate::baseline::{Baseline, BaselineError};
use crate::callgraph::{self, CallEdge, CallGraph};
use crate::diff::{ChangeSet, DiffEngine, FunctionDigest, Identity};
use crate::hash;
use crate::impact::{resolve_impact, ImpactEntry};
use crate::normalize::Normalizer;
use crate::parser::{Parser, ParserError, SyntaxTree};

/// Fatal errors that end a run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A file could not be read or parsed for reasons other than its syntax
    #[error("Failed to analyze {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: ParserError,
    },
    #[error(transparent)]
    Baseline(#[from] BaselineError),
}

/// Options for a run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub parser: Parser,
    pub normalizer: Normalizer,
    pub identity: Identity,
    /// Record syntax failures and continue instead of aborting the batch
    pub keep_going: bool,
    /// Drop baseline entries of functions that no longer exist
    pub prune: bool,
}

/// Everything extracted from one file
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub file: String,
    /// One digest per top-level function, in definition order
    pub functions: Vec<FunctionDigest>,
    pub edges: Vec<CallEdge>,
}

/// A file that failed to parse
#[derive(Debug)]
pub struct SyntaxFailure {
    pub path: PathBuf,
    pub error: ParserError,
}

/// Digests and call edges of an already parsed tree
pub fn analyze_tree(tree: &SyntaxTree, normalizer: &Normalizer, file: &str) -> FileAnalysis {
    let mut functions: Vec<FunctionDigest> = Vec::new();
    for func in tree.functions() {
        let digest = hash::digest(&normalizer.normalize(func.node));
        // A redefinition replaces the earlier body under the same name
        match functions.iter_mut().find(|f| f.name == func.name) {
            Some(existing) => existing.digest = digest,
            None => functions.push(FunctionDigest {
                name: func.name.to_string(),
                digest,
            }),
        }
    }

    FileAnalysis {
        file: file.to_string(),
        functions,
        edges: callgraph::extract_edges(tree, file),
    }
}

/// Parse one file and analyse it
pub fn analyze_file(
    parser: &Parser,
    normalizer: &Normalizer,
    path: &Path,
) -> Result<FileAnalysis, ParserError> {
    let tree = parser.parse_file(path)?;
    let analysis = analyze_tree(&tree, normalizer, &path.display().to_string());
    tracing::debug!(
        path = %path.display(),
        functions = analysis.functions.len(),
        edges = analysis.edges.len(),
        "Analyzed file"
    );
    Ok(analysis)
}

/// Accumulated state of a run
#[derive(Debug)]
pub struct RunState {
    engine: DiffEngine,
    graph: CallGraph,
    syntax_failures: Vec<SyntaxFailure>,
    skipped: Vec<PathBuf>,
    files_analyzed: usize,
}

impl RunState {
    pub fn new(baseline: Baseline, identity: Identity) -> Self {
        Self {
            engine: DiffEngine::new(baseline, identity),
            graph: CallGraph::new(),
            syntax_failures: Vec::new(),
            skipped: Vec::new(),
            files_analyzed: 0,
        }
    }

    /// Fold one file's analysis into the baseline and the call graph
    pub fn absorb(&mut self, analysis: FileAnalysis) {
        self.engine.compare(&analysis.file, &analysis.functions);
        self.graph.merge(CallGraph::from_edges(analysis.edges));
        self.files_analyzed += 1;
    }

    pub fn record_failure(&mut self, failure: SyntaxFailure) {
        self.syntax_failures.push(failure);
    }

    pub fn record_skipped(&mut self, path: PathBuf) {
        self.skipped.push(path);
    }

    pub fn changes(&self) -> &ChangeSet {
        self.engine.changes()
    }

    pub fn graph(&self) -> &CallGraph {
        &self.graph
    }

    /// Resolve impact and hand back everything the caller may persist
    pub fn finish(mut self, prune: bool) -> RunReport {
        let pruned = if prune {
            self.engine.reconcile()
        } else {
            Vec::new()
        };
        let impact = resolve_impact(self.engine.changes(), &self.graph);
        let (baseline, changes) = self.engine.into_parts();
        RunReport {
            baseline,
            changes,
            graph: self.graph,
            impact,
            syntax_failures: self.syntax_failures,
            skipped: self.skipped,
            pruned,
            files_analyzed: self.files_analyzed,
        }
    }
}

/// Result of a completed run. Nothing is persisted yet.
#[derive(Debug)]
pub struct RunReport {
    /// Updated baseline; call [`Baseline::save`] to make it durable
    pub baseline: Baseline,
    pub changes: ChangeSet,
    pub graph: CallGraph,
    pub impact: Vec<ImpactEntry>,
    /// Files that failed to parse (only with `keep_going`)
    pub syntax_failures: Vec<SyntaxFailure>,
    /// Files skipped because they are not UTF-8
    pub skipped: Vec<PathBuf>,
    /// Baseline keys removed by reconciliation
    pub pruned: Vec<String>,
    pub files_analyzed: usize,
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunReport),
    /// First unparsable file in input order; nothing after it was merged
    Aborted(SyntaxFailure),
}

/// Analyse `files` against `baseline`
pub fn run(
    files: &[PathBuf],
    baseline: Baseline,
    options: &RunOptions,
) -> Result<RunOutcome, PipelineError> {
    let _span = tracing::info_span!("run", files = files.len()).entered();

    let analyses: Vec<(&PathBuf, Result<FileAnalysis, ParserError>)> = files
        .par_iter()
        .map(|path| (path, analyze_file(&options.parser, &options.normalizer, path)))
        .collect();

    let mut state = RunState::new(baseline, options.identity);
    for (path, result) in analyses {
        match result {
            Ok(analysis) => state.absorb(analysis),
            Err(error) if error.is_syntax_invalid() => {
                tracing::warn!(path = %path.display(), %error, "Syntax invalid");
                let failure = SyntaxFailure {
                    path: path.clone(),
                    error,
                };
                if !options.keep_going {
                    return Ok(RunOutcome::Aborted(failure));
                }
                state.record_failure(failure);
            }
            Err(ParserError::NonUtf8(p)) => {
                tracing::warn!("Skipping non-UTF8 file: {}", p.display());
                state.record_skipped(p);
            }
            Err(source) => {
                return Err(PipelineError::File {
                    path: path.clone(),
                    source,
                })
            }
        }
    }

    let report = state.finish(options.prune);
    tracing::info!(
        files = report.files_analyzed,
        changed = report.changes.len(),
        impacted = report.impact.len(),
        edges = report.graph.edge_count(),
        "Run complete"
    );
    Ok(RunOutcome::Completed(report))
}
