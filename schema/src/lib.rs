//! Schema Source model for the ontogen code generator.
//!
//! The generator never parses OWL itself. It consumes a read-only view of the
//! ontology through the [`SchemaSource`] trait: classes with their
//! superclasses and instance/subclass counts, and properties with their
//! domains, ranges and restrictions. [`Schema`] is the owned implementation,
//! loadable from JSON with [`json::load_json`].
//!
//! # Entry Point
//!
//! ```
//! use ontogen_schema::{json, SchemaSource};
//!
//! let schema = json::from_json_str(r#"{
//!     "classes": [{
//!         "localName": "Sensor",
//!         "iri": "http://example.org/devices#Sensor",
//!         "namespaceIri": "http://example.org/devices#"
//!     }],
//!     "properties": []
//! }"#).expect("valid schema");
//! assert_eq!(schema.classes().len(), 1);
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

#[cfg(feature = "serde")]
pub mod json;
pub mod model;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
pub use json::SchemaLoadError;
pub use model::{
    iris, ClassDescriptor, Constraint, PropertyDescriptor, PropertyKind, Restriction,
};

/// Read-only access to the classes and properties of a loaded ontology.
///
/// Implementations must return descriptors in a stable order: the generator's
/// output is deterministic only if its input is.
pub trait SchemaSource {
    /// All class descriptors.
    fn classes(&self) -> &[ClassDescriptor];

    /// All property descriptors (object and datatype).
    fn properties(&self) -> &[PropertyDescriptor];
}

/// An owned schema: the concrete Schema Source used by the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Schema {
    /// Class descriptors in extraction order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub classes: Vec<ClassDescriptor>,
    /// Property descriptors in extraction order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub properties: Vec<PropertyDescriptor>,
}

impl SchemaSource for Schema {
    fn classes(&self) -> &[ClassDescriptor] {
        &self.classes
    }

    fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }
}

impl Schema {
    /// Returns the total number of object properties.
    #[must_use]
    pub fn object_property_count(&self) -> usize {
        self.properties
            .iter()
            .filter(|p| p.kind == PropertyKind::Object)
            .count()
    }

    /// Returns the total number of datatype properties.
    #[must_use]
    pub fn datatype_property_count(&self) -> usize {
        self.properties
            .iter()
            .filter(|p| p.kind == PropertyKind::Datatype)
            .count()
    }
}
