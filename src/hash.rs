//! Content digests of normalized function definitions
//!
//! The tree is first written out as a canonical text encoding, then hashed
//! with BLAKE3 (256-bit). The encoding carries no source positions, only
//! node shapes, names and token text, and every variable-length field is
//! length-prefixed so distinct trees cannot encode to the same text.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::parser::{Literal, SyntaxNode};

/// Hex-encoded 256-bit digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Wrap an existing hex digest (e.g. read from a baseline)
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest of a (normalized) subtree
pub fn digest(node: &SyntaxNode) -> Digest {
    let encoded = canonical_encoding(node);
    Digest(blake3::hash(encoded.as_bytes()).to_hex().to_string())
}

/// Canonical text form of a subtree
pub fn canonical_encoding(node: &SyntaxNode) -> String {
    let mut out = String::new();
    encode(node, &mut out);
    out
}

fn encode(node: &SyntaxNode, out: &mut String) {
    match node {
        SyntaxNode::Identifier(name) => field(out, 'I', name),
        SyntaxNode::Token(text) => field(out, 'T', text),
        SyntaxNode::Literal(lit) => match lit {
            Literal::Placeholder => out.push_str("L_"),
            Literal::Str(s) => field(out, 's', s),
            Literal::Integer(s) => field(out, 'i', s),
            Literal::Float(s) => field(out, 'f', s),
            Literal::Boolean(b) => out.push_str(if *b { "b1" } else { "b0" }),
        },
        SyntaxNode::Call { callee, arguments } => {
            out.push_str("C(");
            encode(callee, out);
            encode(arguments, out);
            out.push(')');
        }
        SyntaxNode::Attribute { object, attribute } => {
            field(out, 'A', attribute);
            out.push('(');
            encode(object, out);
            out.push(')');
        }
        SyntaxNode::ExpressionStatement(children) => {
            out.push('E');
            list(children, out);
        }
        SyntaxNode::Function { name, children } => {
            field(out, 'F', name);
            list(children, out);
        }
        SyntaxNode::Branch { kind, children } => {
            field(out, 'B', kind);
            list(children, out);
        }
    }
}

fn field(out: &mut String, tag: char, text: &str) {
    // Writing to a String cannot fail
    let _ = write!(out, "{tag}{}:{text}", text.len());
}

fn list(children: &[SyntaxNode], out: &mut String) {
    out.push('(');
    for child in children {
        encode(child, out);
    }
    out.push(')');
}
