//! # codepulse - Function-level change impact detection
//!
//! Detects which Python functions changed their *logic* since the last run
//! and reports the functions that call them, so those callers can be
//! re-validated.
//!
//! ## How it works
//!
//! - **Parse**: tree-sitter grammar, lowered into an owned [`parser::SyntaxTree`]
//! - **Normalize**: literals become placeholders, diagnostic calls
//!   (`print`, `logger`, `logging`) are removed
//! - **Hash**: BLAKE3 over a canonical encoding of the normalized function
//! - **Diff**: digests are merged into a persisted [`Baseline`]
//! - **Impact**: direct callers of every changed function, from the
//!   [`CallGraph`] built in the same run
//!
//! ## Quick Start
//!
//! ```no_run
//! use codepulse::{Baseline, RunOptions, RunOutcome};
//!
//! # fn main() -> anyhow::Result<()> {
//! let files = vec![std::path::PathBuf::from("app/service.py")];
//! let baseline = Baseline::load(".codepulse/function_hashes.json")?;
//!
//! match codepulse::run(&files, baseline, &RunOptions::default())? {
//!     RunOutcome::Completed(report) => {
//!         report.baseline.save()?;
//!         for entry in &report.impact {
//!             println!("{} in {} needs re-checking", entry.function, entry.file);
//!         }
//!     }
//!     RunOutcome::Aborted(failure) => {
//!         eprintln!("{} does not parse", failure.path.display());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod baseline;
pub mod callgraph;
pub mod config;
pub mod diff;
pub mod hash;
pub mod impact;
pub mod language;
pub mod normalize;
pub mod parser;
pub mod pipeline;

mod persist;

pub use baseline::Baseline;
pub use callgraph::CallGraph;
pub use diff::{ChangeSet, Identity};
pub use hash::Digest;
pub use impact::ImpactEntry;
pub use normalize::Normalizer;
pub use parser::Parser;
pub use pipeline::{run, RunOptions, RunOutcome, RunReport};
