//! Class dependency graph.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::OptimizationError;
use crate::ir::IntermediateRepresentation;

/// One class in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyNode {
    /// Class name.
    pub name: String,
    /// Module of the class.
    pub module: String,
    /// Classes this class needs: generated bases and attribute ranges.
    pub dependencies: BTreeSet<String>,
    /// Classes that need this class.
    pub dependents: BTreeSet<String>,
    /// Member of a strongly connected component with more than one class.
    pub in_cycle: bool,
}

/// Directed graph with an edge `dependent → dependency` per reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    /// Class name → node.
    pub nodes: BTreeMap<String, DependencyNode>,
    /// Classes with an attribute whose range is the class itself.
    ///
    /// Self edges are kept here rather than in the node sets.
    pub self_references: BTreeSet<String>,
}

impl DependencyGraph {
    /// Looks up a node by class name.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&DependencyNode> {
        self.nodes.get(name)
    }

    /// Number of `dependent → dependency` edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.dependencies.len()).sum()
    }
}

/// Builds the dependency graph of `ir`.
///
/// # Errors
///
/// Returns an [`OptimizationError`] if a class is stored under a key other
/// than its name, or has a blank name or module.
pub fn build_graph(ir: &IntermediateRepresentation) -> Result<DependencyGraph, OptimizationError> {
    let mut graph = DependencyGraph::default();
    for (key, class) in &ir.classes {
        if class.name.trim().is_empty() {
            return Err(OptimizationError::BlankName {
                fragment: class.owl_fragment.clone(),
            });
        }
        if *key != class.name {
            return Err(OptimizationError::KeyMismatch {
                key: key.clone(),
                name: class.name.clone(),
            });
        }
        if class.module.trim().is_empty() {
            return Err(OptimizationError::BlankModule(class.name.clone()));
        }
        graph.nodes.insert(
            class.name.clone(),
            DependencyNode {
                name: class.name.clone(),
                module: class.module.clone(),
                dependencies: BTreeSet::new(),
                dependents: BTreeSet::new(),
                in_cycle: false,
            },
        );
    }

    let mut edges: Vec<(&str, &str)> = Vec::new();
    for class in ir.classes.values() {
        for base in &class.bases {
            if *base != class.name && ir.classes.contains_key(base) {
                edges.push((class.name.as_str(), base.as_str()));
            }
        }
        for attr in &class.attrs {
            if attr.range == class.name {
                graph.self_references.insert(class.name.clone());
            } else if ir.classes.contains_key(&attr.range) {
                edges.push((class.name.as_str(), attr.range.as_str()));
            }
        }
    }
    for (from, to) in edges {
        if let Some(node) = graph.nodes.get_mut(from) {
            node.dependencies.insert(to.to_string());
        }
        if let Some(node) = graph.nodes.get_mut(to) {
            node.dependents.insert(from.to_string());
        }
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::ir::{AttrDef, ClassDef, Multiplicity};

    fn ir(classes: Vec<ClassDef>) -> IntermediateRepresentation {
        IntermediateRepresentation::new(classes, BTreeMap::new())
    }

    #[test]
    fn edges_for_bases_and_ranges() {
        let device = ClassDef::new("Device", "m", vec!["GridSTIXDomainObject".to_string()]);
        let sensor = ClassDef::new("Sensor", "m", vec!["Device".to_string()])
            .with_attr(AttrDef::new("reports_to", "Device", Multiplicity::OptionalSingle))
            .with_attr(AttrDef::new("label", "str", Multiplicity::OptionalSingle))
            .with_attr(AttrDef::new("peer", "Sensor", Multiplicity::OptionalMany));
        let graph = build_graph(&ir(vec![device, sensor])).unwrap();

        let sensor = graph.node("Sensor").unwrap();
        assert_eq!(sensor.dependencies.iter().collect::<Vec<_>>(), vec!["Device"]);
        assert!(graph.node("Device").unwrap().dependents.contains("Sensor"));
        assert!(graph.self_references.contains("Sensor"));
        assert!(!sensor.dependencies.contains("Sensor"));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn rejects_malformed_ir() {
        let mut bad = ir(vec![ClassDef::new("A", "m", Vec::new())]);
        let moved = bad.classes.remove("A").unwrap();
        bad.classes.insert("B".to_string(), moved);
        assert!(matches!(
            build_graph(&bad),
            Err(OptimizationError::KeyMismatch { .. })
        ));

        let blank = ir(vec![ClassDef::new("A", " ", Vec::new())]);
        assert!(matches!(
            build_graph(&blank),
            Err(OptimizationError::BlankModule(_))
        ));

        let unnamed = ir(vec![ClassDef::new("", "m", Vec::new())]);
        assert!(matches!(
            build_graph(&unnamed),
            Err(OptimizationError::BlankName { .. })
        ));
    }
}
