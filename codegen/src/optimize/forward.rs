//! Forward-reference assignment.
//!
//! Three rules, all applied:
//!
//! 1. A class in a cycle gets a forward reference to every dependency that is
//!    also in a cycle and lives in the same module.
//! 2. An attribute whose range is its own class is always a forward reference.
//! 3. An attribute whose range is another class of the same module that
//!    refers back to the owner (as a base or attribute range) is a forward
//!    reference, whether or not rule 1 caught it.
//!
//! Consolidation can then put acyclic classes into files that import each
//! other. [`file_cycle_references`] closes those gaps once the file
//! assignment is known.

use std::collections::{BTreeMap, BTreeSet};

use crate::ir::{ClassDef, IntermediateRepresentation};

use super::graph::DependencyGraph;
use super::scc::components;

/// Class name → names it must reference lazily.
pub type ForwardRefs = BTreeMap<String, BTreeSet<String>>;

/// Computes the forward references of every class. Classes without any are
/// absent from the result.
pub fn forward_references(ir: &IntermediateRepresentation, graph: &DependencyGraph) -> ForwardRefs {
    let mut refs = ForwardRefs::new();
    let mut add = |owner: &str, target: &str| {
        refs.entry(owner.to_string())
            .or_default()
            .insert(target.to_string());
    };

    for class in ir.classes.values() {
        if let Some(node) = graph.node(&class.name).filter(|n| n.in_cycle) {
            for dep in &node.dependencies {
                let same_module_cycle = graph
                    .node(dep)
                    .is_some_and(|d| d.in_cycle && d.module == class.module);
                if same_module_cycle {
                    add(&class.name, dep);
                }
            }
        }

        for attr in &class.attrs {
            if attr.range == class.name {
                add(&class.name, &class.name);
            }
        }
    }

    for class in ir.classes.values() {
        for attr in &class.attrs {
            if attr.range == class.name {
                continue;
            }
            let Some(target) = ir.class(&attr.range) else {
                continue;
            };
            if target.module == class.module && target.references(&class.name) {
                add(&class.name, &attr.range);
            }
        }
    }
    refs
}

/// Output file of every class: its consolidated key, or `<module>.<Name>`
/// for a class written to its own file.
fn file_of<'a>(
    consolidated: &'a BTreeMap<String, BTreeSet<String>>,
    ir: &IntermediateRepresentation,
) -> BTreeMap<&'a str, String> {
    let mut files = BTreeMap::new();
    for (key, names) in consolidated {
        for name in names {
            let own = ir.class(name).is_some_and(|c| c.module == *key);
            let file = if own { format!("{key}.{name}") } else { key.clone() };
            files.insert(name.as_str(), file);
        }
    }
    files
}

/// Adds a forward reference for every attribute import that lies on a cycle
/// between output files of one module.
///
/// Files are linked by the bases and eager attribute ranges of their
/// classes. Inside each strongly connected group of files, an attribute
/// whose range lives in a different file of the owner's module becomes a
/// forward reference. Bases stay eager.
pub fn file_cycle_references(
    ir: &IntermediateRepresentation,
    consolidated: &BTreeMap<String, BTreeSet<String>>,
    refs: &mut ForwardRefs,
) {
    let files = file_of(consolidated, ir);
    let mut edges: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for class in ir.classes.values() {
        let Some(from) = files.get(class.name.as_str()) else {
            continue;
        };
        let entry = edges.entry(from.as_str()).or_default();
        let deferred = refs.get(&class.name);
        let attrs = class
            .attrs
            .iter()
            .map(|a| a.range.as_str())
            .filter(|r| !deferred.is_some_and(|d| d.contains(*r)));
        for target in class.bases.iter().map(String::as_str).chain(attrs) {
            if let Some(to) = files.get(target).filter(|to| *to != from) {
                entry.insert(to.as_str());
            }
        }
    }

    let mut group_of: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, group) in components(&edges).into_iter().enumerate() {
        if group.len() > 1 {
            group_of.extend(group.into_iter().map(|file| (file, i)));
        }
    }
    if group_of.is_empty() {
        return;
    }

    for class in ir.classes.values() {
        let Some(from) = files.get(class.name.as_str()) else {
            continue;
        };
        let Some(group) = group_of.get(from.as_str()) else {
            continue;
        };
        for attr in &class.attrs {
            let Some(target) = ir.class(&attr.range) else {
                continue;
            };
            let Some(to) = files.get(attr.range.as_str()) else {
                continue;
            };
            let same_group = group_of.get(to.as_str()) == Some(group);
            if to != from && target.module == class.module && same_group {
                refs.entry(class.name.clone())
                    .or_default()
                    .insert(attr.range.clone());
            }
        }
    }
}

/// Returns fresh copies of `classes` with `forward_ref` set on every attribute
/// whose range is a forward reference of its owner.
pub fn apply_forward_flags(
    classes: &BTreeMap<String, ClassDef>,
    refs: &ForwardRefs,
) -> BTreeMap<String, ClassDef> {
    classes
        .iter()
        .map(|(name, class)| {
            let mut class = class.clone();
            let targets = refs.get(name);
            for attr in &mut class.attrs {
                attr.forward_ref = targets.is_some_and(|t| t.contains(&attr.range));
            }
            (name.clone(), class)
        })
        .collect()
}
