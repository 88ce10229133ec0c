//! Language registry for change detection
//!
//! Each language carries its tree-sitter grammar plus the node-kind tables
//! the lowering, normalization and call extraction passes are driven by.
//! Only Python is registered today.

use std::collections::HashMap;
use std::sync::LazyLock;

mod python;

/// A language definition with all parsing configuration
pub struct LanguageDef {
    /// Language name (e.g., "python")
    pub name: &'static str,
    /// Function to get the tree-sitter grammar
    pub grammar: fn() -> tree_sitter::Language,
    /// File extensions for this language
    pub extensions: &'static [&'static str],
    /// Node kinds that define a function
    pub function_kinds: &'static [&'static str],
    /// Wrapper node kind carrying decorators around a definition
    pub decorated_kind: Option<&'static str>,
    /// Node kind of a direct call expression
    pub call_kind: &'static str,
    /// Node kind of member access (`obj.attr`)
    pub attribute_kind: &'static str,
    /// Node kind of a bare name
    pub identifier_kind: &'static str,
    /// Node kind of a statement made of a single expression
    pub expression_statement_kind: &'static str,
    /// Grouping parentheses that carry no structure of their own
    pub parenthesized_kind: Option<&'static str>,
    /// String literal node kinds
    pub string_kinds: &'static [&'static str],
    /// Adjacent string literals the language joins into one (`"a" "b"`)
    pub concatenated_string_kind: Option<&'static str>,
    /// Child kind that keeps code alive inside a string (f-string interpolation)
    pub interpolation_kind: Option<&'static str>,
    /// Integer literal node kinds
    pub integer_kinds: &'static [&'static str],
    /// Floating point literal node kinds
    pub float_kinds: &'static [&'static str],
    /// `(kind, value)` pairs for boolean literals
    pub boolean_kinds: &'static [(&'static str, bool)],
    /// Nodes dropped during lowering (comments, line continuations)
    pub ignored_kinds: &'static [&'static str],
    /// Anonymous tokens that only separate siblings
    pub separator_tokens: &'static [&'static str],
    /// Call targets whose statements are diagnostics, not logic
    pub diagnostic_calls: &'static [&'static str],
    /// Node kinds the grammar accepts but the language rejects
    pub rejected_kinds: &'static [&'static str],
    /// Extra checks for errors the grammar does not catch. Returns the
    /// offending node, if any.
    pub validate: fn(tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>>,
}

/// Supported programming languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Python (.py files)
    Python,
}

impl Language {
    /// Get the language definition from the registry
    pub fn def(&self) -> &'static LanguageDef {
        match self {
            Language::Python => python::definition(),
        }
    }

    /// Look up a language by file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        REGISTRY
            .from_extension(ext)
            .and_then(|def| def.name.parse().ok())
    }

    /// Look up a language from a path's extension
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Get the tree-sitter grammar for this language
    pub fn grammar(&self) -> tree_sitter::Language {
        (self.def().grammar)()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Python => write!(f, "python"),
        }
    }
}

/// Error returned when parsing an invalid Language string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLanguageError {
    /// The invalid input string
    pub input: String,
}

impl std::fmt::Display for ParseLanguageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unknown language: '{}'. Valid options: python",
            self.input
        )
    }
}

impl std::error::Error for ParseLanguageError {}

impl std::str::FromStr for Language {
    type Err = ParseLanguageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "python" => Ok(Language::Python),
            _ => Err(ParseLanguageError {
                input: s.to_string(),
            }),
        }
    }
}

/// Global language registry
pub static REGISTRY: LazyLock<LanguageRegistry> = LazyLock::new(LanguageRegistry::new);

/// Registry of all supported languages
pub struct LanguageRegistry {
    /// Languages indexed by extension
    by_extension: HashMap<&'static str, &'static LanguageDef>,
}

impl LanguageRegistry {
    fn new() -> Self {
        let mut reg = Self {
            by_extension: HashMap::new(),
        };
        reg.register(python::definition());
        reg
    }

    fn register(&mut self, def: &'static LanguageDef) {
        for ext in def.extensions {
            self.by_extension.insert(*ext, def);
        }
    }

    /// Get a language definition by file extension
    pub fn from_extension(&self, ext: &str) -> Option<&'static LanguageDef> {
        self.by_extension.get(ext).copied()
    }
}
