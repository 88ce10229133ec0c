//! Code parsing with tree-sitter
//!
//! Split into submodules:
//! - `types`: error types
//! - `tree`: the owned syntax tree the analysis passes work on

pub mod tree;
pub mod types;

pub use tree::{FunctionDefinition, Literal, SyntaxNode, SyntaxTree};
pub use types::{Language, ParserError};

use std::path::Path;

use tree::Rejection;

/// Default size guard for a single source file (10MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default nesting cap, counted in parse tree levels.
///
/// The analysis passes recurse over the tree; this keeps them well inside
/// a 2MB thread stack.
pub const DEFAULT_MAX_DEPTH: usize = 400;

/// Source parser producing lowered [`SyntaxTree`]s
///
/// A fresh tree-sitter parser is created per call, so one `Parser` can be
/// shared across rayon workers.
///
/// # Example
///
/// ```no_run
/// use codepulse::Parser;
///
/// let parser = Parser::new();
/// let tree = parser.parse_file(std::path::Path::new("app/service.py"))?;
/// for func in tree.functions() {
///     println!("{}", func.name);
/// }
/// # Ok::<(), codepulse::parser::ParserError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Parser {
    max_file_size: u64,
    max_depth: usize,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set maximum file size accepted by `parse_file`
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set maximum nesting depth before a file is refused
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Read and parse a source file
    pub fn parse_file(&self, path: &Path) -> Result<SyntaxTree, ParserError> {
        let _span = tracing::info_span!("parse_file", path = %path.display()).entered();

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let language = Language::from_extension(ext)
            .ok_or_else(|| ParserError::UnsupportedFileType(ext.to_string()))?;

        let meta = std::fs::metadata(path)?;
        if meta.len() > self.max_file_size {
            tracing::warn!(
                "Refusing to parse large file ({} bytes > {} limit): {}",
                meta.len(),
                self.max_file_size,
                path.display()
            );
            return Err(ParserError::FileTooLarge {
                path: path.to_path_buf(),
                size: meta.len(),
                limit: self.max_file_size,
            });
        }

        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Err(ParserError::NonUtf8(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        self.parse_source(&source, path, language)
    }

    /// Parse source text already in memory
    ///
    /// `path` is recorded on the tree and in errors; it is not read.
    pub fn parse_source(
        &self,
        source: &str,
        path: &Path,
        language: Language,
    ) -> Result<SyntaxTree, ParserError> {
        // Normalize line endings (CRLF -> LF) for consistent hashing across platforms
        let source = source.replace("\r\n", "\n");

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&language.grammar())
            .map_err(|e| ParserError::Grammar(language.to_string(), format!("{:?}", e)))?;

        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| ParserError::SyntaxInvalid {
                path: path.to_path_buf(),
                line: 1,
                column: 0,
            })?;

        let root = tree.root_node();
        if root.has_error() {
            let (line, column) = tree::first_error(root)
                .map(tree::position)
                .unwrap_or((1, 0));
            tracing::debug!(path = %path.display(), line, column, "Syntax error");
            return Err(ParserError::SyntaxInvalid {
                path: path.to_path_buf(),
                line,
                column,
            });
        }

        let lowered = match tree::lower(root, &source, language.def(), self.max_depth) {
            Ok(node) => node.unwrap_or(SyntaxNode::Branch {
                kind: root.kind().to_string(),
                children: Vec::new(),
            }),
            Err(Rejection::TooDeep { line }) => {
                tracing::warn!(
                    path = %path.display(),
                    line,
                    limit = self.max_depth,
                    "Nesting too deep"
                );
                return Err(ParserError::TooDeep {
                    path: path.to_path_buf(),
                    line,
                    limit: self.max_depth,
                });
            }
            Err(Rejection::Invalid { line, column }) => {
                tracing::debug!(
                    path = %path.display(),
                    line,
                    column,
                    "Construct not valid Python 3"
                );
                return Err(ParserError::SyntaxInvalid {
                    path: path.to_path_buf(),
                    line,
                    column,
                });
            }
        };

        Ok(SyntaxTree::new(path.to_path_buf(), language, lowered))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(src: &str) -> Result<SyntaxTree, ParserError> {
        Parser::new().parse_source(src, Path::new("test.py"), Language::Python)
    }

    #[test]
    fn test_top_level_functions_only() {
        let tree = parse(
            "def outer():\n    def inner():\n        pass\n    return inner\n\nclass K:\n    def method(self):\n        pass\n\nasync def fetch():\n    pass\n",
        )
        .unwrap();
        let names: Vec<_> = tree.functions().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["outer", "fetch"]);
    }

    #[test]
    fn test_decorated_function_is_listed() {
        let tree = parse("@cache\ndef compute(x):\n    return x\n").unwrap();
        let funcs = tree.functions();
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].name, "compute");
        assert_eq!(funcs[0].node.kind(), "decorated_definition");
    }

    #[test]
    fn test_syntax_error_reports_location() {
        let err = parse("def broken(:\n    pass\n").unwrap_err();
        match err {
            ParserError::SyntaxInvalid { path, line, .. } => {
                assert_eq!(path, PathBuf::from("test.py"));
                assert_eq!(line, 1);
            }
            other => panic!("expected SyntaxInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_node_is_syntax_error() {
        let err = parse("def f():\n    return (1 + \n").unwrap_err();
        assert!(err.is_syntax_invalid());
    }

    #[test]
    fn test_comments_are_dropped() {
        let a = parse("def f():\n    # explain\n    return 1\n").unwrap();
        let b = parse("def f():\n    return 1\n").unwrap();
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_crlf_matches_lf() {
        let a = parse("def f():\r\n    return g()\r\n").unwrap();
        let b = parse("def f():\n    return g()\n").unwrap();
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_grouping_parens_are_transparent() {
        let a = parse("def f(a, b):\n    return (a + b)\n").unwrap();
        let b = parse("def f(a, b):\n    return a + b\n").unwrap();
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_fstring_keeps_interpolated_code() {
        let tree = parse("def f(x):\n    return f\"value {g(x)}\"\n").unwrap();
        let encoded = format!("{:?}", tree.root());
        assert!(encoded.contains("Identifier(\"g\")"), "{encoded}");
    }

    fn assert_invalid_at(src: &str, want_line: u32, want_column: u32) {
        match parse(src) {
            Err(ParserError::SyntaxInvalid { line, column, .. }) => {
                assert_eq!((line, column), (want_line, want_column), "{src}");
            }
            other => panic!("expected SyntaxInvalid for {src:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_python2_print_statement_rejected() {
        assert_invalid_at("def f():\n    print \"hi\"\n", 2, 4);
    }

    #[test]
    fn test_python2_exec_statement_rejected() {
        assert_invalid_at("def f():\n    exec \"x = 1\"\n", 2, 4);
    }

    #[test]
    fn test_python2_print_chevron_rejected() {
        assert_invalid_at("import sys\nprint >>sys.stderr, \"x\"\n", 2, 0);
    }

    #[test]
    fn test_non_default_after_default_parameter_rejected() {
        assert_invalid_at("def f(a=1, b):\n    return a\n", 1, 11);
        assert_invalid_at("g = lambda a=1, b: a\n", 1, 16);
    }

    #[test]
    fn test_positional_after_keyword_argument_rejected() {
        assert_invalid_at("def f():\n    return g(a=1, b)\n", 2, 18);
        assert_invalid_at("g(**kw, *rest)\n", 1, 8);
    }

    #[test]
    fn test_python3_forms_still_accepted() {
        parse("def f(x):\n    print(x)\n    exec(\"x\")\n").unwrap();
        parse("def f(a, b=1, *args, c, d=2, **kw):\n    return a\n").unwrap();
        parse("def f(a=1, *, b, c: int):\n    return a\n").unwrap();
        parse("def f(a: int = 1, *rest: str, b):\n    return a\n").unwrap();
        parse("def f():\n    return g(1, *a, k=2, *b, **kw)\n").unwrap();
    }

    #[test]
    fn test_deep_nesting_is_refused() {
        let chain = vec!["x"; 3000].join(" + ");
        let src = format!("def f(x):\n    return {chain}\n");
        let err = parse(&src).unwrap_err();
        assert!(
            matches!(err, ParserError::TooDeep { limit: DEFAULT_MAX_DEPTH, .. }),
            "{err:?}"
        );
        assert!(err.is_syntax_invalid());
    }

    #[test]
    fn test_depth_cap_is_configurable() {
        let src = "def f(x):\n    return x + x + x + x\n";
        parse(src).unwrap();
        let err = Parser::new()
            .with_max_depth(3)
            .parse_source(src, Path::new("test.py"), Language::Python)
            .unwrap_err();
        assert!(matches!(err, ParserError::TooDeep { limit: 3, .. }));
    }

    #[test]
    fn test_implicit_concatenation_is_one_literal() {
        let tree = parse("X = \"a\" \"b\"\n").unwrap();
        let encoded = format!("{:?}", tree.root());
        assert!(encoded.contains("Literal(Str("), "{encoded}");
        assert!(!encoded.contains("concatenated_string"), "{encoded}");

        let tree = parse("X = \"a\" f\"{b}\"\n").unwrap();
        let encoded = format!("{:?}", tree.root());
        assert!(encoded.contains("concatenated_string"), "{encoded}");
        assert!(encoded.contains("Identifier(\"b\")"), "{encoded}");
    }

    #[test]
    fn test_parse_file_rejects_unknown_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        let err = Parser::new().parse_file(&path).unwrap_err();
        assert!(matches!(err, ParserError::UnsupportedFileType(ext) if ext == "txt"));
    }

    #[test]
    fn test_parse_file_size_guard() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("big.py");
        std::fs::write(&path, "def f():\n    return 1\n").unwrap();
        let err = Parser::new().with_max_file_size(4).parse_file(&path).unwrap_err();
        assert!(matches!(err, ParserError::FileTooLarge { limit: 4, .. }));
        assert!(err.is_syntax_invalid());
    }

    #[test]
    fn test_parse_file_non_utf8() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("latin1.py");
        std::fs::write(&path, [b'x', b'=', 0xff, 0xfe, b'\n']).unwrap();
        let err = Parser::new().parse_file(&path).unwrap_err();
        assert!(matches!(err, ParserError::NonUtf8(_)));
    }
}
