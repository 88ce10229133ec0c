//! Direct-call extraction and the callee → callers index
//!
//! Only calls whose target is a bare name (`foo(...)`) produce edges.
//! Method calls, subscripted or computed targets are invisible here, and
//! callees are resolved by name alone, never across imports or aliases.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::parser::{SyntaxNode, SyntaxTree};

/// One caller → callee relation found in a file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallEdge {
    pub callee: String,
    pub caller: String,
    pub file: String,
}

/// Caller record stored under a callee
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerRef {
    pub caller: String,
    pub file: String,
}

/// Distinct callee names called directly anywhere inside `node`, in
/// first-seen order
pub fn direct_callees(node: &SyntaxNode) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut callees = Vec::new();
    collect_callees(node, &mut seen, &mut callees);
    callees
}

fn collect_callees(node: &SyntaxNode, seen: &mut HashSet<String>, out: &mut Vec<String>) {
    match node {
        SyntaxNode::Call { callee, arguments } => {
            if let SyntaxNode::Identifier(name) = callee.as_ref() {
                if seen.insert(name.clone()) {
                    out.push(name.clone());
                }
            }
            collect_callees(callee, seen, out);
            collect_callees(arguments, seen, out);
        }
        SyntaxNode::Attribute { object, .. } => collect_callees(object, seen, out),
        SyntaxNode::ExpressionStatement(children)
        | SyntaxNode::Function { children, .. }
        | SyntaxNode::Branch { children, .. } => {
            for child in children {
                collect_callees(child, seen, out);
            }
        }
        SyntaxNode::Identifier(_) | SyntaxNode::Literal(_) | SyntaxNode::Token(_) => {}
    }
}

/// Call edges for every top-level function of a file
pub fn extract_edges(tree: &SyntaxTree, file: &str) -> Vec<CallEdge> {
    let _span = tracing::debug_span!("extract_edges", file).entered();
    let mut edges = Vec::new();
    for func in tree.functions() {
        for callee in direct_callees(func.node) {
            edges.push(CallEdge {
                callee,
                caller: func.name.to_string(),
                file: file.to_string(),
            });
        }
    }
    tracing::debug!(edges = edges.len(), "Extracted call edges");
    edges
}

/// Callee → ordered distinct callers
///
/// Callees keep the order they were first seen in, and so do the callers
/// under each callee. Re-inserting a known `(callee, caller, file)` is a
/// no-op.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    entries: Vec<(String, Vec<CallerRef>)>,
    index: HashMap<String, usize>,
    seen: HashSet<CallEdge>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from edges (e.g. a single file's local call map)
    pub fn from_edges(edges: impl IntoIterator<Item = CallEdge>) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            graph.insert(edge);
        }
        graph
    }

    /// Insert an edge. Returns false if it was already present.
    pub fn insert(&mut self, edge: CallEdge) -> bool {
        if self.seen.contains(&edge) {
            return false;
        }
        let slot = match self.index.get(&edge.callee) {
            Some(&i) => i,
            None => {
                self.entries.push((edge.callee.clone(), Vec::new()));
                self.index
                    .insert(edge.callee.clone(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[slot].1.push(CallerRef {
            caller: edge.caller.clone(),
            file: edge.file.clone(),
        });
        self.seen.insert(edge);
        true
    }

    /// Fold another graph in, keeping this graph's order first
    pub fn merge(&mut self, other: CallGraph) {
        for (callee, callers) in other.entries {
            for r in callers {
                self.insert(CallEdge {
                    callee: callee.clone(),
                    caller: r.caller,
                    file: r.file,
                });
            }
        }
    }

    /// Functions that call `callee` directly
    pub fn callers_of(&self, callee: &str) -> &[CallerRef] {
        self.index
            .get(callee)
            .map(|&i| self.entries[i].1.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate callees and their callers in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CallerRef])> {
        self.entries
            .iter()
            .map(|(callee, callers)| (callee.as_str(), callers.as_slice()))
    }

    /// Number of distinct callees
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct edges
    pub fn edge_count(&self) -> usize {
        self.seen.len()
    }

    /// Write the graph as the call-relation JSON artifact
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        crate::persist::write_atomic(path, json.as_bytes())?;
        tracing::info!(path = %path.display(), callees = self.len(), "Call graph saved");
        Ok(())
    }
}

impl Serialize for CallGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (callee, callers) in &self.entries {
            map.serialize_entry(callee, callers)?;
        }
        map.end()
    }
}
