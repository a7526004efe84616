//! IR Builder: raw schema descriptors → [`IntermediateRepresentation`].
//!
//! The builder resolves every class to a module, sanitizes names, keeps the
//! superclasses that are themselves generated, and turns each property whose
//! domain (or restriction) includes the class into an [`AttrDef`].
//!
//! Problems with a single class never abort the build: the class is skipped
//! and reported as a [`SkippedClass`] with a [`SkipReason`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use ontogen_schema::{iris, ClassDescriptor, Constraint, PropertyDescriptor, SchemaSource};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::IrBuildError;
use crate::ir::{AttrDef, ClassDef, IntermediateRepresentation, Multiplicity, ANY};
use crate::mapping::{is_identifier, normalize_module, primitive_token, Naming};

/// Why a class was left out of the IR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The class resolves to the external module and already exists.
    External,
    /// The class shares its name with a foundation type.
    Foundation,
    /// Neither an IRI prefix nor the declared namespace is mapped to a module.
    NoModule {
        /// The namespace that was tried last.
        namespace: String,
    },
    /// Sanitizing the local name left nothing.
    EmptyName,
    /// The sanitized name is not a valid identifier, e.g. it starts with a digit.
    InvalidIdentifier {
        /// The sanitized name.
        name: String,
    },
    /// Another class already sanitized to the same name.
    DuplicateName {
        /// The sanitized name.
        name: String,
        /// IRI of the class that kept the name.
        kept: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::External => f.write_str("belongs to the external module"),
            SkipReason::Foundation => f.write_str("is a foundation type"),
            SkipReason::NoModule { namespace } => {
                write!(f, "no module mapping for namespace {namespace}")
            }
            SkipReason::EmptyName => f.write_str("name is empty after sanitization"),
            SkipReason::InvalidIdentifier { name } => {
                write!(f, "`{name}` is not a valid identifier")
            }
            SkipReason::DuplicateName { name, kept } => {
                write!(f, "name `{name}` is already used by {kept}")
            }
        }
    }
}

/// A class the builder did not generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedClass {
    /// IRI of the skipped class.
    pub iri: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Result of a build: the IR plus everything that was left out.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    /// The intermediate representation.
    pub ir: IntermediateRepresentation,
    /// Classes that were skipped, in schema order.
    pub skipped: Vec<SkippedClass>,
}

/// A class that passed module resolution and naming.
struct Planned<'s> {
    desc: &'s ClassDescriptor,
    name: String,
    module: String,
    namespace: String,
}

/// Converts schema descriptors into an [`IntermediateRepresentation`].
#[derive(Debug, Clone)]
pub struct IrBuilder {
    config: Config,
    naming: Naming,
    external: String,
}

impl IrBuilder {
    /// Creates a builder from an already validated configuration.
    ///
    /// `reserved` and `reserved_members` are the target language's keywords
    /// and the member names its base type already defines.
    pub fn new(config: Config, reserved: &[&str], reserved_members: &[&str]) -> Self {
        let naming = Naming::new(&config.naming, reserved, reserved_members);
        let external = normalize_module(&config.external_module);
        Self {
            config,
            naming,
            external,
        }
    }

    /// Creates a builder from a configuration file, or the defaults when
    /// `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`IrBuildError::Config`] if the file cannot be read or is
    /// invalid.
    pub fn from_config_file(
        path: Option<&Path>,
        reserved: &[&str],
        reserved_members: &[&str],
    ) -> Result<Self, IrBuildError> {
        let config = match path {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        Ok(Self::new(config, reserved, reserved_members))
    }

    /// The configuration this builder was created with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The naming rules in effect.
    #[must_use]
    pub fn naming(&self) -> &Naming {
        &self.naming
    }

    /// Builds the IR for every class of `source`.
    pub fn build<S: SchemaSource + ?Sized>(&self, source: &S) -> BuildOutput {
        let mut skipped = Vec::new();
        let mut planned: Vec<Planned<'_>> = Vec::new();
        // IRI → sanitized name, for every class that will be generated.
        let mut known: BTreeMap<&str, String> = BTreeMap::new();
        let mut owners: BTreeMap<String, &str> = BTreeMap::new();

        for desc in source.classes() {
            match self.plan_class(desc, &owners) {
                Ok(plan) => {
                    known.insert(desc.iri.as_str(), plan.name.clone());
                    owners.insert(plan.name.clone(), desc.iri.as_str());
                    planned.push(plan);
                }
                Err(reason) => {
                    warn!(class = %desc.iri, %reason, "skipping class");
                    skipped.push(SkippedClass {
                        iri: desc.iri.clone(),
                        reason,
                    });
                }
            }
        }

        let resolver = RangeResolver {
            known: &known,
            naming: &self.naming,
            config: &self.config,
        };
        let mut attrs = collect_attributes(source.properties(), &resolver, &self.naming);

        let classes: Vec<ClassDef> = planned
            .iter()
            .map(|plan| {
                let class_attrs = attrs.remove(plan.desc.iri.as_str()).unwrap_or_default();
                self.class_def(plan, &resolver, class_attrs)
            })
            .collect();

        let namespaces = self
            .config
            .namespaces
            .iter()
            .map(|(iri, module)| (iri.clone(), normalize_module(module)))
            .collect();
        let ir = IntermediateRepresentation::new(classes, namespaces);
        info!(
            classes = ir.classes.len(),
            skipped = skipped.len(),
            modules = ir.modules().len(),
            "built intermediate representation"
        );
        BuildOutput { ir, skipped }
    }

    /// Resolves module and name for one class.
    fn plan_class<'s>(
        &self,
        desc: &'s ClassDescriptor,
        owners: &BTreeMap<String, &str>,
    ) -> Result<Planned<'s>, SkipReason> {
        let (namespace, module) = self.resolve_module(desc)?;
        if module == self.external {
            return Err(SkipReason::External);
        }
        let name = self.naming.class_name(&desc.local_name);
        if name.trim().is_empty() {
            return Err(SkipReason::EmptyName);
        }
        if !is_identifier(&name) {
            return Err(SkipReason::InvalidIdentifier { name });
        }
        if self.config.foundation.contains(&name) {
            return Err(SkipReason::Foundation);
        }
        if let Some(kept) = owners.get(&name) {
            return Err(SkipReason::DuplicateName {
                name,
                kept: (*kept).to_string(),
            });
        }
        Ok(Planned {
            desc,
            name,
            module,
            namespace,
        })
    }

    /// Longest configured prefix of the class IRI, else the declared namespace.
    fn resolve_module(&self, desc: &ClassDescriptor) -> Result<(String, String), SkipReason> {
        let by_prefix = self
            .config
            .namespaces
            .iter()
            .filter(|(ns, _)| desc.iri.starts_with(ns.as_str()))
            .max_by_key(|(ns, _)| ns.len());
        let found = by_prefix.or_else(|| self.config.namespaces.get_key_value(&desc.namespace_iri));
        match found {
            Some((ns, module)) => Ok((ns.clone(), normalize_module(module))),
            None => Err(SkipReason::NoModule {
                namespace: desc.namespace_iri.clone(),
            }),
        }
    }

    fn class_def(
        &self,
        plan: &Planned<'_>,
        resolver: &RangeResolver<'_>,
        attrs: Vec<AttrDef>,
    ) -> ClassDef {
        let desc = plan.desc;
        let mut bases: Vec<String> = Vec::new();
        for parent in &desc.direct_superclasses {
            if parent == iris::OWL_THING {
                continue;
            }
            let Some(base) = resolver.base_name(parent) else {
                debug!(class = %plan.name, parent = %parent, "dropping non-generated superclass");
                continue;
            };
            if base != plan.name && !bases.contains(&base) {
                bases.push(base);
            }
        }
        if bases.is_empty() {
            bases.push(self.default_base(&plan.name).to_string());
        }
        debug!(class = %plan.name, module = %plan.module, attrs = attrs.len(), "built class");

        ClassDef {
            name: plan.name.clone(),
            bases,
            module: plan.module.clone(),
            attrs,
            is_abstract: desc.instance_count == 0 && desc.subclass_count > 0,
            description: desc.description.clone(),
            namespace_iri: Some(plan.namespace.clone()),
            owl_fragment: iris::fragment(&desc.iri).map(str::to_string),
        }
    }

    /// Keyword heuristic for classes with no generated superclass.
    fn default_base(&self, name: &str) -> &str {
        let foundation = &self.config.foundation;
        let lower = name.to_lowercase();
        if lower.contains("relationship") {
            &foundation.relationship_base
        } else if ["event", "telemetry", "traffic", "observable"]
            .iter()
            .any(|k| lower.contains(k))
        {
            &foundation.observable_base
        } else {
            &foundation.domain_base
        }
    }
}

/// Resolves range and superclass IRIs against the classes being generated.
struct RangeResolver<'a> {
    known: &'a BTreeMap<&'a str, String>,
    naming: &'a Naming,
    config: &'a Config,
}

impl RangeResolver<'_> {
    /// Class name for a range entity: generated class, primitive, or [`ANY`].
    fn range(&self, iri: &str) -> String {
        if let Some(name) = self.known.get(iri) {
            return name.clone();
        }
        let local = iris::local_name(iri);
        if let Some(token) = primitive_token(local) {
            return token.to_string();
        }
        let name = self.naming.class_name(local);
        if self.is_generated(&name) || self.config.foundation.contains(&name) {
            return name;
        }
        debug!(range = %iri, "unresolved range, using Any");
        ANY.to_string()
    }

    /// Name of a superclass, if it is generated or a foundation type.
    fn base_name(&self, iri: &str) -> Option<String> {
        if let Some(name) = self.known.get(iri) {
            return Some(name.clone());
        }
        let name = self.naming.class_name(iris::local_name(iri));
        self.config.foundation.contains(&name).then_some(name)
    }

    fn is_generated(&self, name: &str) -> bool {
        self.known.values().any(|n| n == name)
    }
}

/// Per class IRI, the attributes contributed by properties and restrictions.
fn collect_attributes<'s>(
    properties: &'s [PropertyDescriptor],
    resolver: &RangeResolver<'_>,
    naming: &Naming,
) -> BTreeMap<&'s str, Vec<AttrDef>> {
    let mut attrs: BTreeMap<&str, Vec<AttrDef>> = BTreeMap::new();
    for prop in properties {
        let name = naming.attr_name(&prop.local_name);
        if name.is_empty() {
            warn!(property = %prop.local_name, "skipping property with empty attribute name");
            continue;
        }
        if !is_identifier(&name) {
            warn!(property = %prop.local_name, attr = %name, "skipping property with invalid attribute name");
            continue;
        }
        let mut targets: Vec<&str> = prop.domain_classes.iter().map(String::as_str).collect();
        for restriction in &prop.restrictions {
            if let Some(on_class) = restriction.on_class.as_deref() {
                if !targets.contains(&on_class) {
                    targets.push(on_class);
                }
            }
        }
        for class_iri in targets {
            if !resolver.known.contains_key(class_iri) {
                continue;
            }
            let attr = attribute_for(prop, class_iri, &name, resolver, naming);
            merge_attr(attrs.entry(class_iri).or_default(), attr);
        }
    }
    attrs
}

/// Derives one attribute of `prop` as seen from the class `class_iri`.
fn attribute_for(
    prop: &PropertyDescriptor,
    class_iri: &str,
    name: &str,
    resolver: &RangeResolver<'_>,
    naming: &Naming,
) -> AttrDef {
    let mut range = prop
        .range_entities
        .first()
        .map_or_else(|| ANY.to_string(), |iri| resolver.range(iri));
    let mut mult = if prop.is_functional {
        Multiplicity::OptionalSingle
    } else {
        Multiplicity::OptionalMany
    };
    for restriction in prop.restrictions.iter().filter(|r| r.applies_to(class_iri)) {
        let (refined, filler) = refine(&restriction.constraint);
        mult = refined;
        match filler {
            Filler::Keep => {}
            Filler::Any => range = ANY.to_string(),
            Filler::Entity(iri) => range = resolver.range(iri),
        }
    }
    AttrDef {
        name: name.to_string(),
        range,
        mult,
        forward_ref: false,
        functional: prop.is_functional,
        inverse_of: prop
            .inverse_of
            .as_deref()
            .map(|inverse| naming.attr_name(iris::local_name(inverse)))
            .filter(|inverse| !inverse.is_empty()),
        description: prop.description.clone(),
    }
}

/// What a restriction does to the attribute's range.
enum Filler<'a> {
    Keep,
    Any,
    Entity(&'a str),
}

impl<'a> From<&'a Option<String>> for Filler<'a> {
    fn from(filler: &'a Option<String>) -> Self {
        filler.as_deref().map_or(Filler::Keep, Filler::Entity)
    }
}

/// Multiplicity implied by a restriction, plus its effect on the range.
fn refine(constraint: &Constraint) -> (Multiplicity, Filler<'_>) {
    match constraint {
        Constraint::SomeValuesFrom { filler } => (Multiplicity::RequiredMany, Filler::from(filler)),
        Constraint::AllValuesFrom { filler } => (Multiplicity::OptionalMany, Filler::from(filler)),
        Constraint::HasValue { .. } => (Multiplicity::RequiredSingle, Filler::Any),
        Constraint::Exactly { cardinality: 1 } => (Multiplicity::RequiredSingle, Filler::Keep),
        Constraint::Exactly { .. } => (Multiplicity::RequiredMany, Filler::Keep),
        Constraint::Min { cardinality } if *cardinality > 0 => {
            (Multiplicity::RequiredMany, Filler::Keep)
        }
        Constraint::Min { .. } => (Multiplicity::OptionalMany, Filler::Keep),
        Constraint::Max { cardinality: 1 } => (Multiplicity::OptionalSingle, Filler::Keep),
        Constraint::Max { .. } => (Multiplicity::OptionalMany, Filler::Keep),
    }
}

/// Adds `attr`, replacing an earlier attribute of the same name in place.
fn merge_attr(attrs: &mut Vec<AttrDef>, attr: AttrDef) {
    match attrs.iter_mut().find(|a| a.name == attr.name) {
        Some(existing) => {
            debug!(attr = %attr.name, "merging duplicate attribute");
            *existing = attr;
        }
        None => attrs.push(attr),
    }
}
