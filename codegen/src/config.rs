//! Generator configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty document is a
//! valid configuration (though one without namespace mappings generates
//! nothing).
//!
//! ```toml
//! external_module = "stix2"
//!
//! [namespaces]
//! "http://www.anl.gov/sss/grid-stix-2.1-assets.owl#" = "grid_stix.assets"
//! "http://www.anl.gov/sss/grid-stix-2.1-components.owl#" = "grid_stix.components"
//!
//! [naming]
//! reserved_suffix = "_cls"
//!
//! [quality]
//! enabled = true
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Complete generator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Namespace IRI → module path (dot or slash segmented).
    pub namespaces: BTreeMap<String, String>,
    /// Module whose classes already exist elsewhere and are never generated.
    pub external_module: String,
    /// Identifier normalization.
    pub naming: NamingConfig,
    /// File consolidation rules.
    pub consolidation: ConsolidationConfig,
    /// Pre-existing base types.
    pub foundation: FoundationConfig,
    /// Downstream formatters and type checkers.
    pub quality: QualityConfig,
}

/// Identifier normalization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    /// Appended to class names that collide with a reserved word.
    pub reserved_suffix: String,
    /// Appended to attribute names that collide with a reserved word.
    pub reserved_attr_suffix: String,
    /// Segment → replacement, applied to PascalCase class names.
    pub acronyms: BTreeMap<String, String>,
}

/// Consolidation rules: which classes share a file instead of getting their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsolidationConfig {
    /// Class-name suffix marking a controlled-vocabulary class.
    pub vocab_suffix: String,
    /// Shared file stem for controlled-vocabulary classes.
    pub vocab_file: String,
    /// Shared file stem for relationship and union classes.
    pub relationships_file: String,
}

/// The foundation: base types the generator imports but never redefines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FoundationConfig {
    /// Module path of the file declaring the foundation types.
    pub module: String,
    /// Common ancestor of the three default bases.
    pub root_base: String,
    /// Default base for ordinary domain classes.
    pub domain_base: String,
    /// Default base for classes whose name mentions "relationship".
    pub relationship_base: String,
    /// Default base for event/telemetry/traffic/observable classes.
    pub observable_base: String,
    /// Whether to write the foundation module itself.
    pub emit_stub: bool,
}

/// Downstream tool settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityConfig {
    /// Run the tools after emission.
    pub enabled: bool,
    /// Tools to run. Empty means the target's defaults.
    pub tools: Vec<ToolConfig>,
}

/// One external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Display name.
    pub name: String,
    /// Executable, looked up on `PATH`.
    pub program: String,
    /// Arguments; `{out}` is replaced with the output directory.
    #[serde(default)]
    pub args: Vec<String>,
    /// Wall-clock budget. Exceeding it aborts the run.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespaces: BTreeMap::new(),
            external_module: "stix2".to_string(),
            naming: NamingConfig::default(),
            consolidation: ConsolidationConfig::default(),
            foundation: FoundationConfig::default(),
            quality: QualityConfig::default(),
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        let acronyms = [
            ("Ot", "OT"),
            ("It", "IT"),
            ("Ai", "AI"),
            ("Ml", "ML"),
            ("Hmi", "HMI"),
            ("Plc", "PLC"),
            ("Rtu", "RTU"),
            ("Ied", "IED"),
            ("Otdevice", "OTDevice"),
            ("Itdevice", "ITDevice"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            reserved_suffix: "_cls".to_string(),
            reserved_attr_suffix: "_attr".to_string(),
            acronyms,
        }
    }
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            vocab_suffix: "Ov".to_string(),
            vocab_file: "vocab".to_string(),
            relationships_file: "relationships".to_string(),
        }
    }
}

impl Default for FoundationConfig {
    fn default() -> Self {
        Self {
            module: "grid_stix.base".to_string(),
            root_base: "GridSTIXObject".to_string(),
            domain_base: "GridSTIXDomainObject".to_string(),
            relationship_base: "GridSTIXRelationshipObject".to_string(),
            observable_base: "GridSTIXObservableObject".to_string(),
            emit_stub: true,
        }
    }
}

impl FoundationConfig {
    /// The fixed foundation set, root first.
    #[must_use]
    pub fn types(&self) -> [&str; 4] {
        [
            self.root_base.as_str(),
            self.domain_base.as_str(),
            self.relationship_base.as_str(),
            self.observable_base.as_str(),
        ]
    }

    /// Returns true if `name` is one of the foundation types.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types().contains(&name)
    }
}

impl Config {
    /// Reads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not valid TOML, and
    /// [`ConfigError::Invalid`] if it fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is not valid TOML and
    /// [`ConfigError::Invalid`] if it fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the stages rely on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (iri, module) in &self.namespaces {
            if iri.trim().is_empty() {
                return Err(ConfigError::Invalid("empty namespace IRI".to_string()));
            }
            if crate::mapping::module_segments(module).next().is_none() {
                return Err(ConfigError::Invalid(format!(
                    "namespace {iri} maps to an empty module path"
                )));
            }
        }
        if crate::mapping::module_segments(&self.foundation.module).count() < 2 {
            return Err(ConfigError::Invalid(format!(
                "foundation module `{}` must name a package and a file",
                self.foundation.module
            )));
        }
        if let Some(blank) = self.foundation.types().iter().find(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "foundation type name {blank:?} is blank"
            )));
        }
        let consolidation = &self.consolidation;
        if consolidation.vocab_file.trim().is_empty()
            || consolidation.relationships_file.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "consolidation file stems must not be empty".to_string(),
            ));
        }
        for tool in &self.quality.tools {
            if tool.program.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "quality tool `{}` has no program",
                    tool.name
                )));
            }
        }
        Ok(())
    }
}
