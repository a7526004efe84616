//! Intermediate representation: normalized, language-agnostic class model.
//!
//! Built once per run by the [`builder`](crate::builder), consumed by the
//! [`optimize`](crate::optimize) stage, never mutated afterwards.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Range of an attribute whose type could not be resolved.
pub const ANY: &str = "Any";

/// Canonical primitive range tokens.
pub const PRIMITIVES: [&str; 4] = ["str", "int", "float", "bool"];

/// How many values an attribute holds and whether it must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Multiplicity {
    /// Exactly one value.
    RequiredSingle,
    /// Zero or one value.
    OptionalSingle,
    /// One or more values.
    RequiredMany,
    /// Any number of values.
    OptionalMany,
}

impl Multiplicity {
    /// Returns true if the attribute holds a list of values.
    #[must_use]
    pub fn is_many(self) -> bool {
        matches!(self, Multiplicity::RequiredMany | Multiplicity::OptionalMany)
    }
}

/// One typed field on a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttrDef {
    /// Normalized identifier, unique within the owning class.
    pub name: String,
    /// A primitive token, [`ANY`], or another class's name.
    pub range: String,
    /// Multiplicity.
    pub mult: Multiplicity,
    /// Render the range as a deferred reference. Set only by the optimizer.
    pub forward_ref: bool,
    /// Derived from an `owl:FunctionalProperty`.
    pub functional: bool,
    /// Normalized name of the inverse attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inverse_of: Option<String>,
    /// Property comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AttrDef {
    /// Creates an attribute with no metadata.
    pub fn new(name: impl Into<String>, range: impl Into<String>, mult: Multiplicity) -> Self {
        Self {
            name: name.into(),
            range: range.into(),
            mult,
            forward_ref: false,
            functional: false,
            inverse_of: None,
            description: None,
        }
    }
}

/// One generated type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDef {
    /// Unique class name.
    pub name: String,
    /// Ancestor names; the first is the primary parent.
    pub bases: Vec<String>,
    /// Dot-separated module path.
    pub module: String,
    /// Attributes in declaration order.
    pub attrs: Vec<AttrDef>,
    /// No direct instances and at least one subclass.
    pub is_abstract: bool,
    /// Class comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Namespace the module was resolved from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_iri: Option<String>,
    /// Original IRI fragment (e.g., `"photovoltaic-system"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owl_fragment: Option<String>,
}

impl ClassDef {
    /// Creates a class with no attributes or provenance.
    pub fn new(name: impl Into<String>, module: impl Into<String>, bases: Vec<String>) -> Self {
        Self {
            name: name.into(),
            bases,
            module: module.into(),
            attrs: Vec::new(),
            is_abstract: false,
            description: None,
            namespace_iri: None,
            owl_fragment: None,
        }
    }

    /// Appends an attribute (builder style).
    #[must_use]
    pub fn with_attr(mut self, attr: AttrDef) -> Self {
        self.attrs.push(attr);
        self
    }

    /// The primary parent used for single-inheritance targets.
    #[must_use]
    pub fn primary_base(&self) -> Option<&str> {
        self.bases.first().map(String::as_str)
    }

    /// Every type name this class mentions: bases, then attribute ranges.
    pub fn referenced_types(&self) -> impl Iterator<Item = &str> {
        self.bases
            .iter()
            .map(String::as_str)
            .chain(self.attrs.iter().map(|a| a.range.as_str()))
    }

    /// Returns true if this class mentions `name` as a base or attribute range.
    #[must_use]
    pub fn references(&self, name: &str) -> bool {
        self.referenced_types().any(|t| t == name)
    }
}

/// The complete IR for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntermediateRepresentation {
    /// Class name → definition.
    pub classes: BTreeMap<String, ClassDef>,
    /// Namespace IRI → module path, as configured.
    pub namespaces: BTreeMap<String, String>,
    /// Module → classes from other modules it references.
    pub imports: BTreeMap<String, BTreeSet<String>>,
}

impl IntermediateRepresentation {
    /// Assembles an IR and computes its cross-module import table.
    pub fn new(classes: Vec<ClassDef>, namespaces: BTreeMap<String, String>) -> Self {
        let classes: BTreeMap<String, ClassDef> =
            classes.into_iter().map(|c| (c.name.clone(), c)).collect();
        let imports = analyze_imports(&classes);
        Self {
            classes,
            namespaces,
            imports,
        }
    }

    /// Looks up a class by name.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    /// All distinct modules, sorted.
    #[must_use]
    pub fn modules(&self) -> BTreeSet<&str> {
        self.classes.values().map(|c| c.module.as_str()).collect()
    }
}

/// Per module, the classes defined in other modules that its classes reference.
fn analyze_imports(classes: &BTreeMap<String, ClassDef>) -> BTreeMap<String, BTreeSet<String>> {
    let mut imports: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for class in classes.values() {
        let entry = imports.entry(class.module.clone()).or_default();
        for referenced in class.referenced_types() {
            if let Some(target) = classes.get(referenced) {
                if target.module != class.module {
                    entry.insert(target.name.clone());
                }
            }
        }
    }
    imports
}
