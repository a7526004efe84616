//! Dependency Optimizer: IR → [`OptimizedIR`].
//!
//! Builds the class dependency graph, finds cycles, applies the consolidation
//! rules, assigns forward references at class and file level and orders
//! modules. Every
//! step is a pure function of its inputs; [`optimize`] strings them together
//! and returns a fresh structure, leaving the IR untouched.

pub mod consolidate;
pub mod forward;
pub mod graph;
pub mod order;
pub mod scc;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ConsolidationConfig;
use crate::error::OptimizationError;
use crate::ir::{ClassDef, IntermediateRepresentation};

pub use consolidate::{classify, consolidate, FileGroup};
pub use forward::{apply_forward_flags, file_cycle_references, forward_references, ForwardRefs};
pub use graph::{build_graph, DependencyGraph, DependencyNode};
pub use order::{module_dependencies, module_order};
pub use scc::{find_cycles, strongly_connected_components};

/// The sole input of the Code Generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptimizedIR {
    /// Classes with `forward_ref` flags set.
    pub classes: BTreeMap<String, ClassDef>,
    /// Class dependency graph with `in_cycle` flags set.
    pub dependency_graph: DependencyGraph,
    /// Strongly connected components with more than one class.
    pub cycles: Vec<BTreeSet<String>>,
    /// Modules, dependencies first.
    pub module_order: Vec<String>,
    /// Class → classes it references lazily.
    pub forward_refs: ForwardRefs,
    /// Consolidated module key → classes written there.
    pub consolidated_modules: BTreeMap<String, BTreeSet<String>>,
}

impl OptimizedIR {
    /// Looks up a class by name.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    /// Returns true if `owner` references `target` lazily.
    #[must_use]
    pub fn is_forward_ref(&self, owner: &str, target: &str) -> bool {
        self.forward_refs
            .get(owner)
            .is_some_and(|t| t.contains(target))
    }

    /// Classes needing the finalize pass, in module order then by name.
    #[must_use]
    pub fn finalize_list(&self) -> Vec<&ClassDef> {
        let mut list: Vec<&ClassDef> = self
            .forward_refs
            .keys()
            .filter_map(|name| self.classes.get(name))
            .collect();
        let rank: BTreeMap<&str, usize> = self
            .module_order
            .iter()
            .enumerate()
            .map(|(i, m)| (m.as_str(), i))
            .collect();
        let rank_of = |c: &ClassDef| rank.get(c.module.as_str()).copied().unwrap_or(usize::MAX);
        list.sort_by(|a, b| rank_of(a).cmp(&rank_of(b)).then_with(|| a.name.cmp(&b.name)));
        list
    }
}

/// Marks every member of a multi-class component as `in_cycle` and returns
/// those components.
pub fn mark_cycles(graph: &mut DependencyGraph) -> Vec<BTreeSet<String>> {
    let cycles = find_cycles(graph);
    for name in cycles.iter().flatten() {
        if let Some(node) = graph.nodes.get_mut(name) {
            node.in_cycle = true;
        }
    }
    cycles
}

/// Runs the optimizer over `ir`.
///
/// # Errors
///
/// Returns an [`OptimizationError`] if the IR is malformed; see
/// [`build_graph`].
pub fn optimize(
    ir: &IntermediateRepresentation,
    rules: &ConsolidationConfig,
) -> Result<OptimizedIR, OptimizationError> {
    let mut graph = build_graph(ir)?;
    let cycles = mark_cycles(&mut graph);
    for cycle in &cycles {
        debug!(members = ?cycle, "dependency cycle");
    }

    let mut forward_refs = forward_references(ir, &graph);
    let consolidated_modules = consolidate(ir.classes.values(), rules);
    file_cycle_references(ir, &consolidated_modules, &mut forward_refs);
    let classes = apply_forward_flags(&ir.classes, &forward_refs);
    let module_order = module_order(&graph);

    info!(
        classes = classes.len(),
        edges = graph.edge_count(),
        cycles = cycles.len(),
        forward_refs = forward_refs.values().map(BTreeSet::len).sum::<usize>(),
        modules = module_order.len(),
        "optimized intermediate representation"
    );
    Ok(OptimizedIR {
        classes,
        dependency_graph: graph,
        cycles,
        module_order,
        forward_refs,
        consolidated_modules,
    })
}
