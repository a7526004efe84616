//! Import resolution and relative module paths.

use std::collections::BTreeSet;

use crate::ir::ClassDef;
use crate::layout::{FileLoc, Layout};
use crate::mapping::is_builtin_range;
use crate::optimize::OptimizedIR;

/// How one file addresses another module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModuleRef {
    /// Up `ascend` packages from the importing file's package, then down
    /// through `descend`.
    Relative {
        /// Packages to climb; zero means the importer's own package.
        ascend: usize,
        /// Segments below the common ancestor.
        descend: Vec<String>,
    },
    /// Full path from the output root; used when the two paths share no prefix.
    Absolute(Vec<String>),
}

/// Path from a file in package `from` to the module `to`.
///
/// The longest common prefix of the two is found; every remaining `from`
/// segment is one ascend step, every remaining `to` segment a descend step.
#[must_use]
pub fn module_ref(from: &[&str], to: &[&str]) -> ModuleRef {
    let common = from.iter().zip(to).take_while(|(a, b)| a == b).count();
    if common == 0 {
        return ModuleRef::Absolute(to.iter().map(|s| (*s).to_string()).collect());
    }
    ModuleRef::Relative {
        ascend: from.len() - common,
        descend: to[common..].iter().map(|s| (*s).to_string()).collect(),
    }
}

/// One eager import: `name` from `from`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Import {
    /// Module to import from.
    pub from: ModuleRef,
    /// Imported type.
    pub name: String,
}

/// Imports of one class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassImports {
    /// Types imported when the file loads.
    pub eager: BTreeSet<Import>,
    /// Types referenced lazily and bound by the finalize pass.
    pub deferred: BTreeSet<String>,
}

/// Resolves the imports of `class`, written to `owner`.
///
/// Bases are always imported eagerly. An attribute range that is a forward
/// reference of the class is deferred. Everything else is imported from the
/// file that defines it, unless that is `owner` itself.
#[must_use]
pub fn resolve_imports(
    class: &ClassDef,
    owner: &FileLoc,
    ir: &OptimizedIR,
    layout: &Layout,
) -> ClassImports {
    let mut imports = ClassImports::default();
    let package: Vec<&str> = owner.package().collect();
    let eager = |name: &str, imports: &mut ClassImports| {
        let Some(target) = layout.location(name) else {
            return;
        };
        if target != owner {
            imports.eager.insert(Import {
                from: module_ref(&package, &target.full_path()),
                name: name.to_string(),
            });
        }
    };

    for base in &class.bases {
        eager(base, &mut imports);
    }
    for attr in &class.attrs {
        if is_builtin_range(&attr.range) {
            continue;
        }
        if attr.forward_ref || ir.is_forward_ref(&class.name, &attr.range) {
            imports.deferred.insert(attr.range.clone());
        } else {
            eager(&attr.range, &mut imports);
        }
    }
    imports
}
