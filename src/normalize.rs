//! Normalization of function definitions before hashing
//!
//! Two rewrites, applied by one recursive descent over [`SyntaxNode`]:
//! - statements that are nothing but a call to a diagnostic name
//!   (`print(...)`, `logger(...)`, `logging(...)`) are deleted;
//! - every literal scalar is replaced by [`Literal::Placeholder`] in place.
//!
//! Everything else is copied as is, so control flow, operators, names and
//! argument counts still reach the hash.

use std::collections::BTreeSet;

use crate::language::Language;
use crate::parser::{Literal, SyntaxNode};

/// Normalizer configured with a set of diagnostic call names
#[derive(Debug, Clone)]
pub struct Normalizer {
    diagnostic_calls: BTreeSet<String>,
}

impl Normalizer {
    /// Normalizer with the language's built-in diagnostic names
    pub fn new(language: Language) -> Self {
        Self {
            diagnostic_calls: language
                .def()
                .diagnostic_calls
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Add more names whose bare call statements are stripped
    pub fn with_diagnostic_calls<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.diagnostic_calls
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Names currently treated as diagnostics
    pub fn diagnostic_calls(&self) -> impl Iterator<Item = &str> {
        self.diagnostic_calls.iter().map(String::as_str)
    }

    /// Produce the normalized copy of a subtree
    pub fn normalize(&self, node: &SyntaxNode) -> SyntaxNode {
        match node {
            SyntaxNode::Literal(_) => SyntaxNode::Literal(Literal::Placeholder),
            SyntaxNode::Identifier(_) | SyntaxNode::Token(_) => node.clone(),
            SyntaxNode::Call { callee, arguments } => SyntaxNode::Call {
                callee: Box::new(self.normalize(callee)),
                arguments: Box::new(self.normalize(arguments)),
            },
            SyntaxNode::Attribute { object, attribute } => SyntaxNode::Attribute {
                object: Box::new(self.normalize(object)),
                attribute: attribute.clone(),
            },
            SyntaxNode::ExpressionStatement(children) => {
                SyntaxNode::ExpressionStatement(self.normalize_children(children))
            }
            SyntaxNode::Function { name, children } => SyntaxNode::Function {
                name: name.clone(),
                children: self.normalize_children(children),
            },
            SyntaxNode::Branch { kind, children } => SyntaxNode::Branch {
                kind: kind.clone(),
                children: self.normalize_children(children),
            },
        }
    }

    fn normalize_children(&self, children: &[SyntaxNode]) -> Vec<SyntaxNode> {
        children
            .iter()
            .filter(|c| !self.is_diagnostic_statement(c))
            .map(|c| self.normalize(c))
            .collect()
    }

    /// A statement whose only content is a direct call to a diagnostic name.
    ///
    /// Calls through attributes (`logger.info(...)`) are not matched.
    pub fn is_diagnostic_statement(&self, node: &SyntaxNode) -> bool {
        let SyntaxNode::ExpressionStatement(children) = node else {
            return false;
        };
        match children.as_slice() {
            [SyntaxNode::Call { callee, .. }] => matches!(
                callee.as_ref(),
                SyntaxNode::Identifier(name) if self.diagnostic_calls.contains(name)
            ),
            _ => false,
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Language::Python)
    }
}
