//! Module emission order.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use super::graph::DependencyGraph;
use super::scc::components;

/// Module → modules it depends on (never itself).
pub fn module_dependencies(graph: &DependencyGraph) -> BTreeMap<&str, BTreeSet<&str>> {
    let mut deps: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for node in graph.nodes.values() {
        let entry = deps.entry(node.module.as_str()).or_default();
        for dep in &node.dependencies {
            if let Some(target) = graph.node(dep) {
                if target.module != node.module {
                    entry.insert(target.module.as_str());
                }
            }
        }
    }
    deps
}

/// Orders modules so that dependencies come before their dependents.
///
/// Modules are grouped into strongly connected components and the groups are
/// sorted topologically. Among ready groups, single modules go before cyclic
/// groups, then by name. A cyclic group is emitted in lexicographic order and
/// logged as a warning.
pub fn module_order(graph: &DependencyGraph) -> Vec<String> {
    let deps = module_dependencies(graph);
    let groups = components(&deps);
    let group_of: BTreeMap<&str, usize> = groups
        .iter()
        .enumerate()
        .flat_map(|(i, group)| group.iter().map(move |m| (*m, i)))
        .collect();

    let mut waiting_on: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); groups.len()];
    let mut dependents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); groups.len()];
    for (module, targets) in &deps {
        let Some(&from) = group_of.get(module) else {
            continue;
        };
        for target in targets {
            if let Some(&to) = group_of.get(target) {
                if from != to {
                    waiting_on[from].insert(to);
                    dependents[to].insert(from);
                }
            }
        }
    }

    let key = |i: usize| (groups[i].len() > 1, groups[i].first().copied().unwrap_or_default(), i);
    let mut ready: BTreeSet<(bool, &str, usize)> = (0..groups.len())
        .filter(|i| waiting_on[*i].is_empty())
        .map(key)
        .collect();
    let mut order: Vec<String> = Vec::with_capacity(deps.len());

    while let Some((cyclic, _, i)) = ready.pop_first() {
        if cyclic {
            warn!(modules = ?groups[i], "module dependency cycle, emitting in name order");
        }
        order.extend(groups[i].iter().map(|m| (*m).to_string()));
        for dependent in &dependents[i] {
            waiting_on[*dependent].remove(&i);
            if waiting_on[*dependent].is_empty() {
                ready.insert(key(*dependent));
            }
        }
    }
    order
}
