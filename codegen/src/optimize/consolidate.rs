//! File consolidation rules.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::ConsolidationConfig;
use crate::ir::ClassDef;

/// Which output file a class is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileGroup {
    /// Its own file, named after the class.
    Own,
    /// The module's shared controlled-vocabulary file.
    Vocab,
    /// The module's shared relationship file.
    Relationships,
}

/// Picks the file group of a class. Rules are tried in order and the first
/// match wins.
#[must_use]
pub fn classify(name: &str, rules: &ConsolidationConfig) -> FileGroup {
    let suffix = rules.vocab_suffix.as_str();
    if !suffix.is_empty() && name.len() > suffix.len() && name.ends_with(suffix) {
        FileGroup::Vocab
    } else if name.contains("Relationship") || name.starts_with("Union") {
        FileGroup::Relationships
    } else {
        FileGroup::Own
    }
}

/// Key of the consolidated module for `group`: the class module itself, or
/// `<module>.<shared file>`.
#[must_use]
pub fn consolidated_key(module: &str, group: FileGroup, rules: &ConsolidationConfig) -> String {
    match group {
        FileGroup::Own => module.to_string(),
        FileGroup::Vocab => format!("{module}.{}", rules.vocab_file),
        FileGroup::Relationships => format!("{module}.{}", rules.relationships_file),
    }
}

/// Groups every class under its consolidated module key.
pub fn consolidate<'a>(
    classes: impl IntoIterator<Item = &'a ClassDef>,
    rules: &ConsolidationConfig,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for class in classes {
        let group = classify(&class.name, rules);
        groups
            .entry(consolidated_key(&class.module, group, rules))
            .or_default()
            .insert(class.name.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_precedence() {
        let rules = ConsolidationConfig::default();
        assert_eq!(classify("AssetStatusOv", &rules), FileGroup::Vocab);
        assert_eq!(classify("RelationshipTypeOv", &rules), FileGroup::Vocab);
        assert_eq!(classify("SupplyRelationship", &rules), FileGroup::Relationships);
        assert_eq!(classify("UnionAllAssets", &rules), FileGroup::Relationships);
        assert_eq!(classify("Sensor", &rules), FileGroup::Own);
        assert_eq!(classify("Ov", &rules), FileGroup::Own);
    }

    #[test]
    fn groups_by_module_and_file() {
        let rules = ConsolidationConfig::default();
        let classes = [
            ClassDef::new("Sensor", "grid.assets", Vec::new()),
            ClassDef::new("AssetStatusOv", "grid.assets", Vec::new()),
            ClassDef::new("SupplyRelationship", "grid.assets", Vec::new()),
            ClassDef::new("UnionAll", "grid.core", Vec::new()),
        ];
        let groups = consolidate(&classes, &rules);
        let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "grid.assets",
                "grid.assets.relationships",
                "grid.assets.vocab",
                "grid.core.relationships"
            ]
        );
        assert!(groups["grid.assets.vocab"].contains("AssetStatusOv"));
    }
}
