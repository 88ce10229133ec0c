//! Data types for the parser module

use std::path::PathBuf;
use thiserror::Error;

// Re-export from language module (source of truth)
pub use crate::language::Language;

/// Errors that can occur during code parsing
#[derive(Error, Debug)]
pub enum ParserError {
    /// File extension not recognized as a supported language
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    /// Source text is not valid for the language grammar
    #[error("Syntax invalid: {path}:{line}:{column}")]
    SyntaxInvalid {
        path: PathBuf,
        /// 1-indexed line of the first error node
        line: u32,
        /// 0-indexed column of the first error node
        column: u32,
    },
    /// Nesting exceeds the depth cap
    #[error("Nesting deeper than {limit} levels at {path}:{line}")]
    TooDeep {
        path: PathBuf,
        /// 1-indexed line where the cap was hit
        line: u32,
        limit: usize,
    },
    /// File exceeds the parse size guard
    #[error("File too large to parse ({size} bytes > {limit} limit): {path}")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },
    /// File contents are not UTF-8
    #[error("Not valid UTF-8: {0}")]
    NonUtf8(PathBuf),
    /// Grammar could not be loaded into tree-sitter (ABI mismatch)
    #[error("Failed to load grammar for {0}: {1}")]
    Grammar(String, String),
    /// File read error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParserError {
    /// Whether this failure takes the syntax-invalid path (batch abort).
    ///
    /// Oversized and overly nested files count as unparsable: they stand in
    /// for a parse timeout.
    pub fn is_syntax_invalid(&self) -> bool {
        matches!(
            self,
            ParserError::SyntaxInvalid { .. }
                | ParserError::TooDeep { .. }
                | ParserError::FileTooLarge { .. }
        )
    }
}
