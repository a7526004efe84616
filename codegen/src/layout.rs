//! Output layout: which file each class lands in.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::FoundationConfig;
use crate::mapping::module_segments;
use crate::optimize::OptimizedIR;

/// One output file: a module (package directory) plus a file stem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileLoc {
    /// Dot-separated package path.
    pub module: String,
    /// File name without extension.
    pub stem: String,
}

impl FileLoc {
    /// Creates a location.
    pub fn new(module: impl Into<String>, stem: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            stem: stem.into(),
        }
    }

    /// Splits a dotted path into package and stem: `"grid.base"` → `grid` / `base`.
    ///
    /// Returns `None` for a path with fewer than two segments.
    #[must_use]
    pub fn from_dotted(path: &str) -> Option<Self> {
        let segments: Vec<&str> = module_segments(path).collect();
        let (stem, package) = segments.split_last()?;
        if package.is_empty() {
            return None;
        }
        Some(Self::new(package.join("."), *stem))
    }

    /// Package segments.
    pub fn package(&self) -> impl Iterator<Item = &str> {
        module_segments(&self.module)
    }

    /// Package segments followed by the stem.
    #[must_use]
    pub fn full_path(&self) -> Vec<&str> {
        self.package().chain(std::iter::once(self.stem.as_str())).collect()
    }
}

impl fmt::Display for FileLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.stem)
    }
}

/// Class name → output file, for generated and foundation classes.
#[derive(Debug, Clone)]
pub struct Layout {
    locations: BTreeMap<String, FileLoc>,
    foundation: Option<FileLoc>,
    foundation_types: Vec<String>,
}

impl Layout {
    /// Derives the layout from the consolidated module assignment.
    ///
    /// A class filed under its own module gets a file named after itself; a
    /// class filed under `<module>.<stem>` shares the file `<stem>`.
    #[must_use]
    pub fn new(ir: &OptimizedIR, foundation: &FoundationConfig) -> Self {
        let mut locations = BTreeMap::new();
        for (key, names) in &ir.consolidated_modules {
            for name in names {
                let Some(class) = ir.class(name) else {
                    continue;
                };
                let stem = if *key == class.module {
                    name.clone()
                } else {
                    key.strip_prefix(class.module.as_str())
                        .and_then(|rest| rest.strip_prefix('.'))
                        .map_or_else(|| name.clone(), str::to_string)
                };
                locations.insert(name.clone(), FileLoc::new(class.module.clone(), stem));
            }
        }
        for (name, class) in &ir.classes {
            locations
                .entry(name.clone())
                .or_insert_with(|| FileLoc::new(class.module.clone(), name.clone()));
        }
        Self {
            locations,
            foundation: FileLoc::from_dotted(&foundation.module),
            foundation_types: foundation.types().iter().map(|t| (*t).to_string()).collect(),
        }
    }

    /// File of a generated class or foundation type.
    #[must_use]
    pub fn location(&self, name: &str) -> Option<&FileLoc> {
        if self.foundation_types.iter().any(|t| t == name) {
            return self.foundation.as_ref();
        }
        self.locations.get(name)
    }

    /// The foundation file, if the configured module names one.
    #[must_use]
    pub fn foundation(&self) -> Option<&FileLoc> {
        self.foundation.as_ref()
    }

    /// Output file → classes written there, in name order.
    #[must_use]
    pub fn files(&self) -> BTreeMap<&FileLoc, Vec<&str>> {
        let mut files: BTreeMap<&FileLoc, Vec<&str>> = BTreeMap::new();
        for (name, loc) in &self.locations {
            files.entry(loc).or_default().push(name);
        }
        files
    }
}
