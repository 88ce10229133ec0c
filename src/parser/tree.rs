//! Owned syntax tree lowered from tree-sitter
//!
//! tree-sitter trees borrow the source and expose every node through one
//! untyped `Node` handle. The passes downstream (normalization, hashing,
//! call extraction) want a closed set of node shapes they can match on
//! exhaustively, so the parse tree is lowered once into [`SyntaxNode`].
//!
//! Lowering drops everything without meaning: comments, line
//! continuations, separator tokens and grouping parentheses. Source
//! positions are not carried over.

use std::path::{Path, PathBuf};

use crate::language::{Language, LanguageDef};

/// Literal scalar value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    /// String text, quotes and prefixes included
    Str(String),
    /// Integer text as written (`0x1f`, `1_000`, `3j`)
    Integer(String),
    /// Float text as written
    Float(String),
    Boolean(bool),
    /// Canonical stand-in written by the normalizer
    Placeholder,
}

/// A node of the lowered syntax tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyntaxNode {
    /// Bare name
    Identifier(String),
    /// Literal scalar
    Literal(Literal),
    /// Anonymous token: keyword, operator or bracket
    Token(String),
    /// Call expression
    Call {
        callee: Box<SyntaxNode>,
        arguments: Box<SyntaxNode>,
    },
    /// Member access `object.attribute`
    Attribute {
        object: Box<SyntaxNode>,
        attribute: String,
    },
    /// Statement consisting of expressions only
    ExpressionStatement(Vec<SyntaxNode>),
    /// Function definition; `children` covers the whole definition
    Function {
        name: String,
        children: Vec<SyntaxNode>,
    },
    /// Any other named node
    Branch {
        kind: String,
        children: Vec<SyntaxNode>,
    },
}

impl SyntaxNode {
    /// Node kind label used for diagnostics and encoding
    pub fn kind(&self) -> &str {
        match self {
            SyntaxNode::Identifier(_) => "identifier",
            SyntaxNode::Literal(_) => "literal",
            SyntaxNode::Token(t) => t,
            SyntaxNode::Call { .. } => "call",
            SyntaxNode::Attribute { .. } => "attribute",
            SyntaxNode::ExpressionStatement(_) => "expression_statement",
            SyntaxNode::Function { .. } => "function",
            SyntaxNode::Branch { kind, .. } => kind,
        }
    }
}

/// A top-level function definition borrowed from a [`SyntaxTree`]
#[derive(Debug, Clone, Copy)]
pub struct FunctionDefinition<'a> {
    /// Function name (identity within the file)
    pub name: &'a str,
    /// The whole top-level statement, decorators included
    pub node: &'a SyntaxNode,
}

/// Lowered syntax tree for one source file
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    path: PathBuf,
    language: Language,
    root: SyntaxNode,
}

impl SyntaxTree {
    pub(crate) fn new(path: PathBuf, language: Language, root: SyntaxNode) -> Self {
        Self {
            path,
            language,
            root,
        }
    }

    /// Source file this tree was parsed from
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Module root node
    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// Top-level function definitions in source order.
    ///
    /// Functions nested in other functions or in classes are not listed;
    /// they stay part of their enclosing definition.
    pub fn functions(&self) -> Vec<FunctionDefinition<'_>> {
        let decorated = self.language.def().decorated_kind;
        let statements = match &self.root {
            SyntaxNode::Branch { children, .. } => children.as_slice(),
            _ => return Vec::new(),
        };

        statements
            .iter()
            .filter_map(|stmt| match stmt {
                SyntaxNode::Function { name, .. } => Some(FunctionDefinition {
                    name: name.as_str(),
                    node: stmt,
                }),
                SyntaxNode::Branch { kind, children } if Some(kind.as_str()) == decorated => {
                    children.iter().find_map(|c| match c {
                        SyntaxNode::Function { name, .. } => Some(FunctionDefinition {
                            name: name.as_str(),
                            node: stmt,
                        }),
                        _ => None,
                    })
                }
                _ => None,
            })
            .collect()
    }
}

/// Find the first ERROR or MISSING node, depth-first
pub(crate) fn first_error(root: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        let mut cursor = node.walk();
        let flagged: Vec<_> = node
            .children(&mut cursor)
            .filter(|c| c.has_error() || c.is_missing())
            .collect();
        stack.extend(flagged.into_iter().rev());
    }
    None
}

/// Why a parse tree could not be lowered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    /// Nesting went past the depth cap
    TooDeep { line: u32 },
    /// The grammar accepted a construct the language does not
    Invalid { line: u32, column: u32 },
}

/// 1-indexed line, 0-indexed column
pub(crate) fn position(node: tree_sitter::Node<'_>) -> (u32, u32) {
    let pos = node.start_position();
    (pos.row as u32 + 1, pos.column as u32)
}

/// Lower a parse tree into a [`SyntaxNode`].
///
/// Every pass after this one recurses over the lowered tree, so nesting
/// beyond `max_depth` is refused here instead of overflowing the stack later.
pub(crate) fn lower(
    root: tree_sitter::Node<'_>,
    source: &str,
    def: &LanguageDef,
    max_depth: usize,
) -> Result<Option<SyntaxNode>, Rejection> {
    Lowerer {
        source,
        def,
        max_depth,
    }
    .lower(root, 0)
}

struct Lowerer<'a> {
    source: &'a str,
    def: &'a LanguageDef,
    max_depth: usize,
}

impl Lowerer<'_> {
    fn text(&self, node: tree_sitter::Node<'_>) -> String {
        self.source[node.byte_range()].to_string()
    }

    /// Returns `None` for nodes without meaning
    fn lower(
        &self,
        node: tree_sitter::Node<'_>,
        depth: usize,
    ) -> Result<Option<SyntaxNode>, Rejection> {
        let def = self.def;
        let kind = node.kind();
        if def.ignored_kinds.contains(&kind) {
            return Ok(None);
        }

        if !node.is_named() {
            if def.separator_tokens.contains(&kind) {
                return Ok(None);
            }
            return Ok(Some(SyntaxNode::Token(kind.to_string())));
        }

        if depth > self.max_depth {
            let (line, _) = position(node);
            return Err(Rejection::TooDeep { line });
        }
        let offending = if def.rejected_kinds.contains(&kind) {
            Some(node)
        } else {
            (def.validate)(node)
        };
        if let Some(bad) = offending {
            let (line, column) = position(bad);
            return Err(Rejection::Invalid { line, column });
        }

        if kind == def.identifier_kind {
            return Ok(Some(SyntaxNode::Identifier(self.text(node))));
        }
        if def.string_kinds.contains(&kind) {
            return self.lower_string(node, depth).map(Some);
        }
        if Some(kind) == def.concatenated_string_kind && !self.has_interpolation(node) {
            return Ok(Some(SyntaxNode::Literal(Literal::Str(self.text(node)))));
        }
        if def.integer_kinds.contains(&kind) {
            return Ok(Some(SyntaxNode::Literal(Literal::Integer(self.text(node)))));
        }
        if def.float_kinds.contains(&kind) {
            return Ok(Some(SyntaxNode::Literal(Literal::Float(self.text(node)))));
        }
        if let Some((_, value)) = def.boolean_kinds.iter().find(|(k, _)| *k == kind) {
            return Ok(Some(SyntaxNode::Literal(Literal::Boolean(*value))));
        }

        if Some(kind) == def.parenthesized_kind {
            let mut inner = Vec::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                inner.extend(self.lower(child, depth + 1)?);
            }
            if inner.len() == 1 {
                return Ok(inner.pop());
            }
            return Ok(Some(SyntaxNode::Branch {
                kind: kind.to_string(),
                children: inner,
            }));
        }

        if kind == def.call_kind {
            let callee = self.lower_field(node, "function", depth)?;
            let arguments = self.lower_field(node, "arguments", depth)?;
            if let (Some(callee), Some(arguments)) = (callee, arguments) {
                return Ok(Some(SyntaxNode::Call {
                    callee: Box::new(callee),
                    arguments: Box::new(arguments),
                }));
            }
        }

        if kind == def.attribute_kind {
            let object = self.lower_field(node, "object", depth)?;
            let attribute = node.child_by_field_name("attribute").map(|c| self.text(c));
            if let (Some(object), Some(attribute)) = (object, attribute) {
                return Ok(Some(SyntaxNode::Attribute {
                    object: Box::new(object),
                    attribute,
                }));
            }
        }

        let children = self.lower_children(node, depth)?;

        if kind == def.expression_statement_kind {
            return Ok(Some(SyntaxNode::ExpressionStatement(children)));
        }

        if def.function_kinds.contains(&kind) {
            if let Some(name) = node.child_by_field_name("name") {
                return Ok(Some(SyntaxNode::Function {
                    name: self.text(name),
                    children,
                }));
            }
        }

        Ok(Some(SyntaxNode::Branch {
            kind: kind.to_string(),
            children,
        }))
    }

    fn lower_field(
        &self,
        node: tree_sitter::Node<'_>,
        field: &str,
        depth: usize,
    ) -> Result<Option<SyntaxNode>, Rejection> {
        match node.child_by_field_name(field) {
            Some(child) => self.lower(child, depth + 1),
            None => Ok(None),
        }
    }

    fn lower_children(
        &self,
        node: tree_sitter::Node<'_>,
        depth: usize,
    ) -> Result<Vec<SyntaxNode>, Rejection> {
        let mut children = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            children.extend(self.lower(child, depth + 1)?);
        }
        Ok(children)
    }

    /// Whether a string, or any piece of an implicit concatenation, embeds code
    fn has_interpolation(&self, node: tree_sitter::Node<'_>) -> bool {
        let interpolation = self.def.interpolation_kind;
        let mut cursor = node.walk();
        let found = node.named_children(&mut cursor).any(|c| {
            Some(c.kind()) == interpolation
                || (self.def.string_kinds.contains(&c.kind()) && self.has_interpolation(c))
        });
        found
    }

    /// Plain strings become one literal. Strings with interpolations keep the
    /// interpolated code and turn each text run into its own literal.
    fn lower_string(
        &self,
        node: tree_sitter::Node<'_>,
        depth: usize,
    ) -> Result<SyntaxNode, Rejection> {
        if !self.has_interpolation(node) {
            return Ok(SyntaxNode::Literal(Literal::Str(self.text(node))));
        }

        let interpolation = self.def.interpolation_kind;
        let mut children = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if Some(child.kind()) == interpolation {
                children.extend(self.lower(child, depth + 1)?);
            } else if child.kind() == "string_content" {
                children.push(SyntaxNode::Literal(Literal::Str(self.text(child))));
            }
        }

        Ok(SyntaxNode::Branch {
            kind: node.kind().to_string(),
            children,
        })
    }
}
