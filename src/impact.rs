//! Impact resolution: who must re-check after a change
//!
//! Direct callers only. A caller of a caller is not reported; it is reached
//! on a later run if the caller's own logic changes.

use std::collections::HashSet;

use serde::Serialize;

use crate::callgraph::CallGraph;
use crate::diff::ChangeSet;

/// A caller that needs re-validation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImpactEntry {
    /// Calling function name
    pub function: String,
    /// File the calling function lives in
    pub file: String,
}

/// Direct callers of every changed function, deduplicated by
/// `(function, file)` in first-seen order
pub fn resolve_impact(changes: &ChangeSet, graph: &CallGraph) -> Vec<ImpactEntry> {
    let _span = tracing::info_span!("resolve_impact", changed = changes.len()).entered();
    let mut seen = HashSet::new();
    let mut impacted = Vec::new();

    for name in changes.iter() {
        let callers = graph.callers_of(name);
        if callers.is_empty() {
            tracing::debug!(function = name, "Changed function has no recorded callers");
            continue;
        }
        for caller in callers {
            if seen.insert((caller.caller.as_str(), caller.file.as_str())) {
                impacted.push(ImpactEntry {
                    function: caller.caller.clone(),
                    file: caller.file.clone(),
                });
            }
        }
    }

    tracing::debug!(impacted = impacted.len(), "Impact resolved");
    impacted
}
