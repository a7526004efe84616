//! Strongly connected components.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use super::graph::DependencyGraph;

/// Strongly connected components of a named graph.
///
/// `edges` maps each node to the nodes it depends on; targets missing from
/// the map are ignored. Nodes and edges are inserted in key order, so the
/// result is deterministic. A component appears only after every component
/// it has an edge into. Members of each component are sorted.
pub(crate) fn components<'a>(edges: &BTreeMap<&'a str, BTreeSet<&'a str>>) -> Vec<Vec<&'a str>> {
    let mut graph: DiGraph<&'a str, ()> = DiGraph::with_capacity(edges.len(), edges.len());
    let index: BTreeMap<&str, NodeIndex> = edges
        .keys()
        .map(|name| (*name, graph.add_node(*name)))
        .collect();
    for (from, targets) in edges {
        for to in targets {
            if let (Some(&a), Some(&b)) = (index.get(from), index.get(to)) {
                graph.add_edge(a, b, ());
            }
        }
    }
    tarjan_scc(&graph)
        .into_iter()
        .map(|component| {
            let mut names: Vec<&'a str> = component.into_iter().map(|i| graph[i]).collect();
            names.sort_unstable();
            names
        })
        .collect()
}

/// All strongly connected components of the class graph, singletons included.
///
/// Each component is sorted; components are sorted by their first member.
pub fn strongly_connected_components(graph: &DependencyGraph) -> Vec<BTreeSet<String>> {
    let edges: BTreeMap<&str, BTreeSet<&str>> = graph
        .nodes
        .iter()
        .map(|(name, node)| {
            (
                name.as_str(),
                node.dependencies.iter().map(String::as_str).collect(),
            )
        })
        .collect();

    let mut found: Vec<BTreeSet<String>> = components(&edges)
        .into_iter()
        .map(|c| c.into_iter().map(str::to_string).collect())
        .collect();
    found.sort();
    found
}

/// Components with more than one class.
pub fn find_cycles(graph: &DependencyGraph) -> Vec<BTreeSet<String>> {
    strongly_connected_components(graph)
        .into_iter()
        .filter(|c| c.len() > 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::graph::DependencyNode;

    fn graph(edges: &[(&str, &str)], extra: &[&str]) -> DependencyGraph {
        let mut graph = DependencyGraph::default();
        let names = edges
            .iter()
            .flat_map(|(a, b)| [*a, *b])
            .chain(extra.iter().copied());
        for name in names {
            graph.nodes.entry(name.to_string()).or_insert_with(|| DependencyNode {
                name: name.to_string(),
                module: "m".to_string(),
                dependencies: BTreeSet::new(),
                dependents: BTreeSet::new(),
                in_cycle: false,
            });
        }
        for (a, b) in edges {
            if let Some(node) = graph.nodes.get_mut(*a) {
                node.dependencies.insert((*b).to_string());
            }
        }
        graph
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn two_node_cycle() {
        let g = graph(&[("X", "Y"), ("Y", "X")], &[]);
        assert_eq!(find_cycles(&g), vec![set(&["X", "Y"])]);
    }

    #[test]
    fn chain_has_no_cycles() {
        let g = graph(&[("A", "B"), ("B", "C")], &["D"]);
        assert!(find_cycles(&g).is_empty());
        assert_eq!(strongly_connected_components(&g).len(), 4);
    }

    #[test]
    fn separate_cycles_and_tails() {
        let g = graph(
            &[("A", "B"), ("B", "C"), ("C", "A"), ("C", "D"), ("D", "E"), ("E", "D"), ("F", "A")],
            &[],
        );
        assert_eq!(find_cycles(&g), vec![set(&["A", "B", "C"]), set(&["D", "E"])]);
    }

    #[test]
    fn dependencies_come_out_first() {
        // a → b → c, c ↔ d
        let edges: BTreeMap<&str, BTreeSet<&str>> = [
            ("a", BTreeSet::from(["b"])),
            ("b", BTreeSet::from(["c"])),
            ("c", BTreeSet::from(["d"])),
            ("d", BTreeSet::from(["c"])),
        ]
        .into_iter()
        .collect();
        assert_eq!(components(&edges), vec![vec!["c", "d"], vec!["b"], vec!["a"]]);
    }

    #[test]
    fn long_ring_is_one_component() {
        let n = 2_000;
        let names: Vec<String> = (0..n).map(|i| format!("N{i:04}")).collect();
        let edges: BTreeMap<&str, BTreeSet<&str>> = (0..n)
            .map(|i| (names[i].as_str(), BTreeSet::from([names[(i + 1) % n].as_str()])))
            .collect();
        let found = components(&edges);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].len(), n);
    }
}
