//! Python target: pydantic models, one package per module.
//!
//! Field shapes by multiplicity:
//!
//! | Multiplicity    | Annotation    | Default                        |
//! |-----------------|---------------|--------------------------------|
//! | optional-single | `Optional[T]` | `None`                         |
//! | required-single | `T`           | none                           |
//! | optional-many   | `list[T]`     | `Field(default_factory=list)`  |
//! | required-many   | `list[T]`     | `Field(min_length=1)`          |
//!
//! A forward reference is written as a string annotation and left
//! unimported; the package manifest's `_finalize()` binds it with
//! `model_rebuild`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as FmtWrite;

use crate::config::{FoundationConfig, ToolConfig};
use crate::emit::{normalize_comment, SourceFile};
use crate::error::RenderError;
use crate::imports::{Import, ModuleRef};
use crate::ir::{AttrDef, ClassDef, Multiplicity, ANY};
use crate::mapping::is_identifier;

use super::{ClassUnit, FileUnit, Manifest, Target};

const GENERATED: &str = "# @generated by ontogen. Do not edit by hand.";

/// Python keywords, soft keywords and the constants `None`/`True`/`False`.
const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "case", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "match", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Members of `pydantic.BaseModel` a field must not shadow.
const MODEL_MEMBERS: &[&str] = &[
    "type",
    "copy",
    "dict",
    "json",
    "schema",
    "schema_json",
    "construct",
    "validate",
    "fields",
    "parse_obj",
    "parse_raw",
    "parse_file",
    "from_orm",
    "update_forward_refs",
    "model_config",
    "model_fields",
    "model_extra",
    "model_fields_set",
    "model_computed_fields",
    "model_construct",
    "model_copy",
    "model_dump",
    "model_dump_json",
    "model_json_schema",
    "model_post_init",
    "model_rebuild",
    "model_validate",
    "model_validate_json",
];

/// Emits pydantic v2 models.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonTarget;

impl Target for PythonTarget {
    fn name(&self) -> &'static str {
        "python"
    }

    fn file_extension(&self) -> &'static str {
        "py"
    }

    fn manifest_stem(&self) -> &'static str {
        "__init__"
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        KEYWORDS
    }

    fn reserved_member_names(&self) -> &'static [&'static str] {
        MODEL_MEMBERS
    }

    fn render_header(&self, file: &FileUnit<'_>) -> String {
        let mut f = SourceFile::new();
        f.line(GENERATED);
        let names: Vec<&str> = file.classes.iter().map(|c| c.class.name.as_str()).collect();
        let _ = writeln!(f.buf, "\"\"\"`{}`: {}.\"\"\"", file.loc, names.join(", "));
        f.blank();

        let classes: Vec<&ClassDef> = file.classes.iter().map(|c| c.class).collect();
        let typing = typing_imports(&classes);
        if !typing.is_empty() {
            let _ = writeln!(f.buf, "from typing import {}", typing.join(", "));
            f.blank();
        }
        if classes.iter().flat_map(|c| &c.attrs).any(needs_field) {
            f.line("from pydantic import Field");
            f.blank();
        }
        for line in import_lines(&file.imports()) {
            f.line(&line);
        }
        f.finish()
    }

    fn render_class(&self, unit: &ClassUnit<'_>) -> Result<String, RenderError> {
        let class = unit.class;
        check_identifier("class", &class.name)?;
        let parent = class.primary_base().ok_or(RenderError::NoBase)?;
        for base in &class.bases {
            check_identifier("base class", base)?;
        }

        let mut f = SourceFile::new();
        let _ = writeln!(f.buf, "class {}({parent}):", class.name);
        let mut empty = true;

        if let Some(doc) = class.description.as_deref().map(normalize_comment) {
            if !doc.is_empty() {
                f.indented(1, &format!("\"\"\"{}\"\"\"", escape_docstring(&doc)));
                f.blank();
                empty = false;
            }
        }

        if class.bases.len() > 1 {
            let _ = writeln!(
                f.buf,
                "    __ontology_bases__: ClassVar[tuple[type, ...]] = ({},)",
                class.bases.join(", ")
            );
            empty = false;
        }
        if class.is_abstract {
            f.indented(1, "__ontology_abstract__: ClassVar[bool] = True");
            empty = false;
        }
        if !empty {
            f.blank();
        }

        for attr in &class.attrs {
            check_identifier("attribute", &attr.name)?;
            f.indented(1, &field(attr));
            empty = false;
        }
        if empty {
            f.indented(1, "pass");
        }
        Ok(f.finish())
    }

    fn render_manifest(&self, manifest: &Manifest) -> String {
        let mut f = SourceFile::new();
        f.line(GENERATED);
        let _ = writeln!(f.buf, "\"\"\"Package `{}`.\"\"\"", manifest.package);
        f.blank();

        if manifest.has_classes() {
            f.line("from typing import Any");
            f.blank();
            for (stem, names) in &manifest.exports {
                let _ = writeln!(f.buf, "from .{stem} import {}", names.join(", "));
            }
            f.blank();
            f.line("__all__ = [");
            for name in manifest.exported_names() {
                let _ = writeln!(f.buf, "    \"{name}\",");
            }
            f.line("]");
            f.blank();
            let quoted: Vec<String> = manifest.finalize.iter().map(|n| format!("\"{n}\"")).collect();
            let _ = writeln!(f.buf, "__finalize__: list[str] = [{}]", quoted.join(", "));
            f.blank_lines(2);
            f.line("def _finalize() -> None:");
            f.indented(1, "\"\"\"Bind the deferred annotations of this package's classes.\"\"\"");
            f.indented(1, "namespace: dict[str, Any] = {name: globals()[name] for name in __all__}");
            f.indented(1, "for name in __finalize__:");
            f.indented(2, "namespace[name].model_rebuild(_types_namespace=namespace)");
        }

        if let Some(modules) = &manifest.finalize_modules {
            f.blank_lines(2);
            f.line("def _finalize_all() -> None:");
            f.indented(1, "\"\"\"Run every generated module's finalize pass, dependencies first.\"\"\"");
            if modules.is_empty() {
                f.indented(1, "pass");
            }
            for path in modules {
                if path.is_empty() {
                    f.indented(1, "_finalize()");
                    continue;
                }
                let alias = format!("_finalize_{}", path.join("_"));
                f.indented(
                    1,
                    &format!("from .{} import _finalize as {alias}", path.join(".")),
                );
                f.blank();
                f.indented(1, &format!("{alias}()"));
            }
            f.blank_lines(2);
            f.line("_finalize_all()");
        }
        f.finish()
    }

    fn render_foundation(&self, foundation: &FoundationConfig) -> String {
        let mut f = SourceFile::new();
        f.line(GENERATED);
        f.line("\"\"\"Foundation types shared by every generated class.\"\"\"");
        f.blank();
        f.line("from pydantic import BaseModel, ConfigDict");
        f.blank_lines(2);
        let _ = writeln!(f.buf, "class {}(BaseModel):", foundation.root_base);
        f.indented(1, "\"\"\"Common ancestor of every generated class.\"\"\"");
        f.blank();
        f.indented(1, "model_config = ConfigDict(populate_by_name=True)");
        let children = [
            (&foundation.domain_base, "Base of domain objects."),
            (&foundation.relationship_base, "Base of relationship objects."),
            (&foundation.observable_base, "Base of observable objects."),
        ];
        for (name, doc) in children {
            f.blank_lines(2);
            let _ = writeln!(f.buf, "class {name}({}):", foundation.root_base);
            f.indented(1, &format!("\"\"\"{doc}\"\"\""));
        }
        f.finish()
    }

    fn default_tools(&self) -> Vec<ToolConfig> {
        vec![
            ToolConfig {
                name: "black".to_string(),
                program: "black".to_string(),
                args: vec!["{out}".to_string()],
                timeout_secs: 300,
            },
            ToolConfig {
                name: "mypy".to_string(),
                program: "mypy".to_string(),
                args: vec!["--strict".to_string(), "{out}".to_string()],
                timeout_secs: 600,
            },
        ]
    }
}

/// `typing` names a file needs, sorted.
fn typing_imports(classes: &[&ClassDef]) -> Vec<&'static str> {
    let mut names = BTreeSet::new();
    for class in classes {
        if class.bases.len() > 1 || class.is_abstract {
            names.insert("ClassVar");
        }
        for attr in &class.attrs {
            if attr.range == ANY {
                names.insert("Any");
            }
            if attr.mult == Multiplicity::OptionalSingle {
                names.insert("Optional");
            }
        }
    }
    names.into_iter().collect()
}

fn needs_field(attr: &AttrDef) -> bool {
    attr.mult.is_many() || attr.description.is_some()
}

/// `from x import A, B` lines, one per module.
fn import_lines(imports: &BTreeSet<&Import>) -> Vec<String> {
    let mut by_module: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
    for import in imports {
        by_module
            .entry(module_path(&import.from))
            .or_default()
            .insert(&import.name);
    }
    by_module
        .into_iter()
        .map(|(module, names)| {
            let names: Vec<&str> = names.into_iter().collect();
            format!("from {module} import {}", names.join(", "))
        })
        .collect()
}

/// Python spelling of a module reference: one dot for the current package,
/// one more per level up.
fn module_path(module: &ModuleRef) -> String {
    match module {
        ModuleRef::Relative { ascend, descend } => {
            format!("{}{}", ".".repeat(ascend + 1), descend.join("."))
        }
        ModuleRef::Absolute(path) => path.join("."),
    }
}

/// One field declaration.
fn field(attr: &AttrDef) -> String {
    let ty = if attr.forward_ref {
        format!("\"{}\"", attr.range)
    } else {
        attr.range.clone()
    };
    let description = attr
        .description
        .as_deref()
        .map(normalize_comment)
        .filter(|d| !d.is_empty())
        .map(|d| format!("description={}", quote(&d)));
    let name = &attr.name;
    match (attr.mult, description) {
        (Multiplicity::OptionalSingle, None) => format!("{name}: Optional[{ty}] = None"),
        (Multiplicity::OptionalSingle, Some(d)) => {
            format!("{name}: Optional[{ty}] = Field(default=None, {d})")
        }
        (Multiplicity::RequiredSingle, None) => format!("{name}: {ty}"),
        (Multiplicity::RequiredSingle, Some(d)) => format!("{name}: {ty} = Field({d})"),
        (Multiplicity::OptionalMany, d) => format!(
            "{name}: list[{ty}] = Field(default_factory=list{})",
            d.map(|d| format!(", {d}")).unwrap_or_default()
        ),
        (Multiplicity::RequiredMany, d) => format!(
            "{name}: list[{ty}] = Field(min_length=1{})",
            d.map(|d| format!(", {d}")).unwrap_or_default()
        ),
    }
}

/// A double-quoted Python string literal.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

fn escape_docstring(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"");
    if escaped.ends_with('"') {
        format!("{escaped} ")
    } else {
        escaped
    }
}

fn check_identifier(kind: &'static str, name: &str) -> Result<(), RenderError> {
    if is_identifier(name) && !KEYWORDS.contains(&name) {
        Ok(())
    } else {
        Err(RenderError::InvalidIdentifier {
            kind,
            name: name.to_string(),
        })
    }
}
