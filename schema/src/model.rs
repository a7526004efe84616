//! Schema descriptor types.
//!
//! These are the read-only records a Schema Source hands to the generator:
//! one [`ClassDescriptor`] per OWL class and one [`PropertyDescriptor`] per
//! object or datatype property. Entities are referenced by full IRI
//! throughout; the generator derives identifiers from the IRI's local name.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An OWL class as seen by the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ClassDescriptor {
    /// Local name of the class (e.g., `"photovoltaic-system"`).
    pub local_name: String,
    /// Full IRI (e.g., `"http://example.org/assets#photovoltaic-system"`).
    pub iri: String,
    /// Base IRI of the namespace the class was declared in.
    pub namespace_iri: String,
    /// Full IRIs of the direct superclasses (`rdfs:subClassOf`), in declaration order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub direct_superclasses: Vec<String>,
    /// Number of named individuals asserted directly on this class.
    #[cfg_attr(feature = "serde", serde(default))]
    pub instance_count: usize,
    /// Number of direct subclasses.
    #[cfg_attr(feature = "serde", serde(default))]
    pub subclass_count: usize,
    /// `rdfs:comment` (or `rdfs:label` when no comment exists).
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
}

/// Whether a property relates two resources or a resource and a literal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PropertyKind {
    /// `owl:ObjectProperty`.
    #[default]
    Object,
    /// `owl:DatatypeProperty`.
    Datatype,
}

/// An OWL object or datatype property.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PropertyDescriptor {
    /// Local name of the property (e.g., `"hasComponent"`).
    pub local_name: String,
    /// Object or datatype property.
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: PropertyKind,
    /// Full IRIs of the domain classes.
    #[cfg_attr(feature = "serde", serde(default))]
    pub domain_classes: Vec<String>,
    /// Range entities: class IRIs or XSD datatype IRIs. Only the first is used.
    #[cfg_attr(feature = "serde", serde(default))]
    pub range_entities: Vec<String>,
    /// Whether this is also an `owl:FunctionalProperty`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_functional: bool,
    /// Local name of the inverse property, if declared.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub inverse_of: Option<String>,
    /// Restrictions that mention this property.
    #[cfg_attr(feature = "serde", serde(default))]
    pub restrictions: Vec<Restriction>,
    /// `rdfs:comment` (or `rdfs:label` when no comment exists).
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
}

/// An OWL restriction over a property.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Restriction {
    /// IRI of the class carrying the restriction. `None` applies it to every
    /// domain class of the property.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub on_class: Option<String>,
    /// The restriction itself.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub constraint: Constraint,
}

impl Restriction {
    /// Returns true if this restriction applies to the class with the given IRI.
    #[must_use]
    pub fn applies_to(&self, class_iri: &str) -> bool {
        self.on_class.as_deref().map_or(true, |c| c == class_iri)
    }
}

/// The constraint carried by a [`Restriction`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "camelCase"))]
pub enum Constraint {
    /// `owl:someValuesFrom`, optionally naming the filler class.
    SomeValuesFrom {
        /// Filler entity IRI.
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        filler: Option<String>,
    },
    /// `owl:allValuesFrom`, optionally naming the filler class.
    AllValuesFrom {
        /// Filler entity IRI.
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        filler: Option<String>,
    },
    /// `owl:hasValue`.
    HasValue {
        /// The literal or individual, kept for provenance only.
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        value: Option<String>,
    },
    /// `owl:cardinality` / `owl:qualifiedCardinality`.
    Exactly {
        /// Exact number of values.
        cardinality: u32,
    },
    /// `owl:minCardinality`.
    Min {
        /// Minimum number of values.
        cardinality: u32,
    },
    /// `owl:maxCardinality`.
    Max {
        /// Maximum number of values.
        cardinality: u32,
    },
}

/// Standard IRI constants and helpers.
pub mod iris {
    /// OWL namespace.
    pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
    /// RDFS namespace.
    pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    /// XSD namespace.
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    /// `owl:Thing`.
    pub const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";

    /// Extracts the local name from a full IRI (after the last `/` or `#`).
    ///
    /// A bare name without either separator is returned unchanged.
    #[must_use]
    pub fn local_name(iri: &str) -> &str {
        let after_slash = iri.rsplit('/').next().unwrap_or(iri);
        after_slash.rsplit('#').next().unwrap_or(after_slash)
    }

    /// Returns the fragment after `#`, if the IRI has one.
    #[must_use]
    pub fn fragment(iri: &str) -> Option<&str> {
        iri.split_once('#').map(|(_, frag)| frag).filter(|f| !f.is_empty())
    }
}
