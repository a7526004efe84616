//! End-to-end runs over JSON schemas: load, build, optimize, generate.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use ontogen_codegen::ir::ANY;
use ontogen_codegen::pipeline::{plan, run, run_with_source, Plan, PipelineOptions};
use ontogen_codegen::targets::PythonTarget;
use ontogen_schema::json::from_json_str;
use ontogen_schema::Schema;
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use serde_json::{json, Value};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;
use walkdir::WalkDir;

const GRID: &str = "http://example.org/grid#";
const REL: &str = "http://example.org/rel#";
const M1: &str = "http://example.org/m1#";
const M2: &str = "http://example.org/m2#";
const CORE: &str = "http://example.org/core#";

const CONFIG: &str = r#"
[namespaces]
"http://example.org/grid#" = "grid_stix/assets"
"http://example.org/rel#" = "rel"
"http://example.org/m1#" = "pkg.m1"
"http://example.org/m2#" = "pkg.m2"
"http://example.org/core#" = "pkg.core"
"http://example.org/ext#" = "stix2"
"#;

fn class(ns: &str, name: &str, superclasses: &[&str]) -> Value {
    json!({
        "localName": name,
        "iri": format!("{ns}{name}"),
        "namespaceIri": ns,
        "directSuperclasses": superclasses,
    })
}

fn functional(name: &str, domain: &str, range: Option<&str>) -> Value {
    json!({
        "localName": name,
        "domainClasses": [domain],
        "rangeEntities": range.into_iter().collect::<Vec<_>>(),
        "isFunctional": true,
    })
}

fn schema(classes: Vec<Value>, properties: Vec<Value>) -> Schema {
    let doc = json!({ "classes": classes, "properties": properties });
    from_json_str(&doc.to_string()).unwrap()
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ontogen.toml"), CONFIG).unwrap();
        Self { dir }
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("ontogen.toml")
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn options(&self) -> PipelineOptions {
        PipelineOptions {
            schema: self.dir.path().join("schema.json"),
            output_dir: self.out(),
            config: Some(self.config()),
            clean: false,
            quality: Some(false),
        }
    }

    fn plan(&self, schema: &Schema) -> Plan {
        plan(schema, Some(self.config().as_path()), &PythonTarget).unwrap()
    }

    fn generate(&self, schema: &Schema) -> ontogen_codegen::GenerationReport {
        run_with_source(schema, &self.options(), &PythonTarget).unwrap()
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.out().join(rel)).unwrap_or_else(|e| panic!("{rel}: {e}"))
    }
}

fn refs(plan: &Plan, owner: &str) -> BTreeSet<String> {
    plan.optimized.forward_refs.get(owner).cloned().unwrap_or_default()
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn acyclic_reference_is_imported_directly() {
    let ws = Workspace::new();
    let schema = schema(
        vec![
            class(GRID, "Device", &[]),
            class(GRID, "Sensor", &[format!("{GRID}Device").as_str()]),
        ],
        vec![functional(
            "reportsTo",
            &format!("{GRID}Sensor"),
            Some(format!("{GRID}Device").as_str()),
        )],
    );

    let plan = ws.plan(&schema);
    assert!(plan.optimized.forward_refs.is_empty());
    assert!(plan.optimized.cycles.is_empty());

    ws.generate(&schema);
    let sensor = ws.read("grid_stix/assets/Sensor.py");
    assert!(sensor.contains("from .Device import Device\n"));
    assert!(sensor.contains("class Sensor(Device):\n"));
    assert!(sensor.contains("    reports_to: Optional[Device] = None\n"));
    let device = ws.read("grid_stix/assets/Device.py");
    assert!(device.contains("from ..base import GridSTIXDomainObject\n"));
    assert!(device.contains("class Device(GridSTIXDomainObject):\n"));
}

#[test]
fn two_class_cycle_is_deferred_both_ways() {
    let ws = Workspace::new();
    let x = format!("{REL}X");
    let y = format!("{REL}Y");
    let schema = schema(
        vec![class(REL, "X", &[]), class(REL, "Y", &[])],
        vec![
            functional("partner", &x, Some(y.as_str())),
            functional("partner", &y, Some(x.as_str())),
        ],
    );

    let plan = ws.plan(&schema);
    assert_eq!(plan.optimized.cycles, vec![set(&["X", "Y"])]);
    assert_eq!(refs(&plan, "X"), set(&["Y"]));
    assert_eq!(refs(&plan, "Y"), set(&["X"]));

    let report = ws.generate(&schema);
    assert_eq!(report.finalize, vec!["X", "Y"]);
    let x_file = ws.read("rel/X.py");
    assert!(!x_file.contains("import Y"));
    assert!(x_file.contains("    partner: Optional[\"Y\"] = None\n"));
    assert!(x_file.contains("from grid_stix.base import GridSTIXDomainObject\n"));
    let y_file = ws.read("rel/Y.py");
    assert!(!y_file.contains("import X"));

    let manifest = ws.read("rel/__init__.py");
    assert!(manifest.contains("from .X import X\nfrom .Y import Y\n"));
    assert!(manifest.contains("__finalize__: list[str] = [\"X\", \"Y\"]"));
    assert!(manifest.contains("model_rebuild(_types_namespace=namespace)"));
    assert!(manifest.ends_with("_finalize_all()\n"));
}

#[test]
fn self_reference_is_forward_without_a_cycle() {
    let ws = Workspace::new();
    let z = format!("{GRID}Zone");
    let schema = schema(
        vec![class(GRID, "Zone", &[])],
        vec![functional("parent", &z, Some(z.as_str()))],
    );

    let plan = ws.plan(&schema);
    assert!(plan.optimized.cycles.is_empty());
    assert_eq!(refs(&plan, "Zone"), set(&["Zone"]));
    assert!(plan.optimized.dependency_graph.self_references.contains("Zone"));

    ws.generate(&schema);
    let zone = ws.read("grid_stix/assets/Zone.py");
    assert!(zone.contains("    parent: Optional[\"Zone\"] = None\n"));
    let manifest = ws.read("grid_stix/assets/__init__.py");
    assert!(manifest.contains("__finalize__: list[str] = [\"Zone\"]"));
    let root = ws.read("grid_stix/__init__.py");
    assert!(root.contains("from .assets import _finalize as _finalize_assets"));
}

#[test]
fn missing_range_becomes_any() {
    let ws = Workspace::new();
    let sensor = format!("{GRID}Sensor");
    let schema = schema(
        vec![class(GRID, "Sensor", &[])],
        vec![
            functional("label", &sensor, None),
            functional("vendor", &sensor, Some("http://example.org/ext#Identity")),
        ],
    );

    let plan = ws.plan(&schema);
    let class = plan.optimized.class("Sensor").unwrap();
    let ranges: BTreeMap<&str, &str> = class
        .attrs
        .iter()
        .map(|a| (a.name.as_str(), a.range.as_str()))
        .collect();
    assert_eq!(ranges.get("label"), Some(&ANY));
    assert_eq!(ranges.get("vendor"), Some(&ANY));
    let node = plan.optimized.dependency_graph.node("Sensor").unwrap();
    assert!(node.dependencies.is_empty());

    ws.generate(&schema);
    let text = ws.read("grid_stix/assets/Sensor.py");
    assert!(text.contains("from typing import Any, Optional\n"));
    assert!(text.contains("    label: Optional[Any] = None\n"));
    let imports: Vec<&str> = text.lines().filter(|l| l.starts_with("from .")).collect();
    assert!(imports.is_empty(), "unexpected imports {imports:?}");
}

#[test]
fn module_cycle_still_orders_every_module() {
    let ws = Workspace::new();
    let a = format!("{M1}Alpha");
    let b = format!("{M2}Beta");
    let schema = schema(
        vec![class(M1, "Alpha", &[]), class(M2, "Beta", &[])],
        vec![
            functional("beta", &a, Some(b.as_str())),
            functional("alpha", &b, Some(a.as_str())),
        ],
    );

    let plan = ws.plan(&schema);
    assert_eq!(plan.optimized.module_order, vec!["pkg.m1", "pkg.m2"]);
    assert_eq!(plan.optimized.cycles, vec![set(&["Alpha", "Beta"])]);
    assert!(plan.optimized.forward_refs.is_empty());

    let report = ws.generate(&schema);
    assert_eq!(report.classes_emitted, 2);
    let root = ws.read("pkg/__init__.py");
    let m1 = root.find("_finalize_m1()").unwrap();
    let m2 = root.find("_finalize_m2()").unwrap();
    assert!(m1 < m2);
    assert!(ws.read("pkg/m1/Alpha.py").contains("from ..m2.Beta import Beta\n"));
}

/// Log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn module_cycle_is_logged_as_a_warning() {
    let ws = Workspace::new();
    let a = format!("{M1}Alpha");
    let b = format!("{M2}Beta");
    let schema = schema(
        vec![class(M1, "Alpha", &[]), class(M2, "Beta", &[])],
        vec![
            functional("beta", &a, Some(b.as_str())),
            functional("alpha", &b, Some(a.as_str())),
        ],
    );

    let logs = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let plan = tracing::subscriber::with_default(subscriber, || ws.plan(&schema));
    assert_eq!(plan.optimized.module_order, vec!["pkg.m1", "pkg.m2"]);

    let text = logs.text();
    let line = text
        .lines()
        .find(|l| l.contains("module dependency cycle"))
        .unwrap_or_else(|| panic!("no cycle warning in {text:?}"));
    assert!(line.contains("WARN"));
    assert!(line.contains("pkg.m1") && line.contains("pkg.m2"));
}

#[test]
fn acyclic_modules_log_no_cycle_warning() {
    let ws = Workspace::new();
    let schema = schema(vec![class(M1, "Alpha", &[]), class(M2, "Beta", &[])], vec![]);
    let logs = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    tracing::subscriber::with_default(subscriber, || ws.plan(&schema));
    assert!(!logs.text().contains("module dependency cycle"));
}

// =============================================================================
// Builder behaviour through the pipeline
// =============================================================================

#[test]
fn skipped_classes_are_reported() {
    let ws = Workspace::new();
    let schema = schema(
        vec![
            class(GRID, "Device", &[]),
            class("http://example.org/ext#", "Identity", &[]),
            class("http://unmapped.example/#", "Orphan", &[]),
            class(GRID, "---", &[]),
        ],
        vec![],
    );
    let report = ws.generate(&schema);
    assert_eq!(report.classes_emitted, 1);
    assert_eq!(report.skipped.len(), 3);
    assert!(report.skipped.iter().any(|s| s.contains("Orphan")));
}

#[test]
fn restrictions_shape_fields_and_vocabularies_share_a_file() {
    let ws = Workspace::new();
    let device = format!("{GRID}Device");
    let status = format!("{GRID}StatusOv");
    let schema = schema(
        vec![class(GRID, "Device", &[]), class(GRID, "StatusOv", &[])],
        vec![
            json!({
                "localName": "hasStatus",
                "domainClasses": [device],
                "rangeEntities": [status],
                "restrictions": [{ "onClass": device, "type": "min", "cardinality": 1 }],
            }),
            json!({
                "localName": "serialNumber",
                "kind": "datatype",
                "domainClasses": [device],
                "rangeEntities": ["http://www.w3.org/2001/XMLSchema#string"],
                "restrictions": [{ "type": "exactly", "cardinality": 1 }],
                "description": "Manufacturer serial.",
            }),
        ],
    );
    ws.generate(&schema);
    let text = ws.read("grid_stix/assets/Device.py");
    assert!(text.contains("    has_status: list[StatusOv] = Field(min_length=1)\n"));
    assert!(text.contains("from .vocab import StatusOv\n"));
    assert!(text.contains("serial_number: str = Field(description=\"Manufacturer serial.\")"));
    assert!(ws.read("grid_stix/assets/vocab.py").contains("class StatusOv(GridSTIXDomainObject):"));
}

// =============================================================================
// Loadable output
// =============================================================================

/// Scenario B plus two shapes that only go wrong once classes share files:
/// a relationship subclass defined beside its base, and an acyclic chain
/// that runs through the vocabulary file and back.
fn shared_file_schema() -> Schema {
    let x = format!("{REL}X");
    let y = format!("{REL}Y");
    let alpha = format!("{CORE}AlphaRelationship");
    let beta = format!("{CORE}BetaRelationship");
    let status = format!("{CORE}StatusOv");
    let device = format!("{CORE}Device");
    let kind = format!("{CORE}KindOv");
    schema(
        vec![
            class(REL, "X", &[]),
            class(REL, "Y", &[]),
            class(CORE, "AlphaRelationship", &[beta.as_str()]),
            class(CORE, "BetaRelationship", &[]),
            class(CORE, "StatusOv", &[]),
            class(CORE, "Device", &[]),
            class(CORE, "KindOv", &[]),
        ],
        vec![
            functional("partner", &x, Some(y.as_str())),
            functional("partner", &y, Some(x.as_str())),
            functional("alpha", &beta, Some(alpha.as_str())),
            functional("device", &status, Some(device.as_str())),
            functional("kind", &device, Some(kind.as_str())),
        ],
    )
}

/// Same-package imports between generated files, as `file → imported file`.
fn sibling_imports(root: &Path) -> Vec<(String, String)> {
    let mut edges = Vec::new();
    for (rel, text) in snapshot(root) {
        let Some(package) = rel.parent() else {
            continue;
        };
        for line in text.lines() {
            let Some(rest) = line.strip_prefix("from .") else {
                continue;
            };
            if rest.starts_with('.') || rel.ends_with("__init__.py") {
                continue;
            }
            let Some(module) = rest.split_whitespace().next() else {
                continue;
            };
            let target = package.join(format!("{module}.py"));
            edges.push((rel.display().to_string(), target.display().to_string()));
        }
    }
    edges
}

/// Class names in the order a file defines them.
fn defined_classes(text: &str) -> Vec<(&str, &str)> {
    text.lines()
        .filter_map(|l| l.strip_prefix("class "))
        .filter_map(|l| {
            let (name, rest) = l.split_once('(')?;
            let base = rest.split_once(')')?.0;
            Some((name, base))
        })
        .collect()
}

#[test]
fn shared_files_define_bases_first_and_never_import_each_other() {
    let ws = Workspace::new();
    let schema = shared_file_schema();
    let plan = ws.plan(&schema);
    assert_eq!(refs(&plan, "Device"), set(&["KindOv"]));
    assert_eq!(refs(&plan, "StatusOv"), set(&["Device"]));

    let report = ws.generate(&schema);
    assert!(report.finalize.iter().any(|n| n == "Device"));

    let relationships = ws.read("pkg/core/relationships.py");
    let order: Vec<&str> = defined_classes(&relationships).into_iter().map(|(n, _)| n).collect();
    assert_eq!(order, vec!["BetaRelationship", "AlphaRelationship"]);
    for (rel, text) in snapshot(&ws.out()) {
        let defined = defined_classes(&text);
        for (i, (_, base)) in defined.iter().enumerate() {
            if let Some(at) = defined.iter().position(|(n, _)| n == base) {
                assert!(at < i, "{} defines {base} after its subclass", rel.display());
            }
        }
    }

    let device = ws.read("pkg/core/Device.py");
    assert!(!device.contains("from .vocab import"));
    assert!(device.contains("    kind: Optional[\"KindOv\"] = None\n"));

    let edges = sibling_imports(&ws.out());
    let graph: DiGraphMap<&str, ()> = edges
        .iter()
        .map(|(from, to)| (from.as_str(), to.as_str()))
        .collect();
    assert!(!is_cyclic_directed(&graph), "import cycle among {edges:?}");
}

fn python_with_pydantic() -> bool {
    Command::new("python3")
        .args(["-c", "import pydantic"])
        .output()
        .is_ok_and(|o| o.status.success())
}

#[test]
fn generated_packages_import_and_instantiate() {
    if !python_with_pydantic() {
        eprintln!("skipping: python3 with pydantic not available");
        return;
    }
    let ws = Workspace::new();
    ws.generate(&shared_file_schema());

    let script = "\
import pkg.core
import rel
from rel import X, Y
from pkg.core import AlphaRelationship, BetaRelationship, Device, KindOv, StatusOv
x = X(partner=Y(partner=None))
assert isinstance(x.partner, Y)
s = StatusOv(device=Device(kind=KindOv()))
assert isinstance(s.device.kind, KindOv)
b = BetaRelationship(alpha=AlphaRelationship())
assert issubclass(AlphaRelationship, BetaRelationship)
";
    let output = Command::new("python3")
        .args(["-c", script])
        .current_dir(ws.out())
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "python failed:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
}

// =============================================================================
// Orchestration
// =============================================================================

fn snapshot(root: &Path) -> BTreeMap<PathBuf, String> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read_to_string(e.path()).unwrap())
        })
        .collect()
}

fn mixed_schema() -> Schema {
    let x = format!("{REL}X");
    let y = format!("{REL}Y");
    let z = format!("{GRID}Zone");
    schema(
        vec![
            class(REL, "X", &[]),
            class(REL, "Y", &[x.as_str()]),
            class(GRID, "Zone", &[]),
            class(GRID, "SupplyRelationship", &[]),
        ],
        vec![
            functional("partner", &x, Some(y.as_str())),
            functional("parent", &z, Some(z.as_str())),
            json!({ "localName": "zones", "domainClasses": [y], "rangeEntities": [z] }),
        ],
    )
}

#[test]
fn repeated_runs_are_byte_identical() {
    let first = Workspace::new();
    let second = Workspace::new();
    let schema = mixed_schema();

    let a = serde_json::to_string(&first.plan(&schema).optimized).unwrap();
    let b = serde_json::to_string(&second.plan(&schema).optimized).unwrap();
    assert_eq!(a, b);

    first.generate(&schema);
    second.generate(&schema);
    let left = snapshot(&first.out());
    assert!(!left.is_empty());
    assert_eq!(left, snapshot(&second.out()));
    assert!(left.contains_key(Path::new("grid_stix/assets/relationships.py")));
}

#[test]
fn run_reads_the_schema_file_and_cleans() {
    let ws = Workspace::new();
    let doc = json!({
        "classes": [class(GRID, "Device", &[])],
        "properties": [],
    });
    fs::write(ws.dir.path().join("schema.json"), doc.to_string()).unwrap();
    fs::create_dir_all(ws.out().join("grid_stix/assets")).unwrap();
    fs::write(ws.out().join("grid_stix/assets/Stale.py"), "x = 1\n").unwrap();

    let mut options = ws.options();
    options.clean = true;
    let report = run(&options, &PythonTarget).unwrap();
    assert_eq!(report.removed, 1);
    assert!(!ws.out().join("grid_stix/assets/Stale.py").exists());
    assert!(ws.out().join("grid_stix/assets/Device.py").exists());
}

#[test]
fn invalid_config_names_the_build_stage() {
    let ws = Workspace::new();
    fs::write(ws.config(), "[namespaces]\n\"http://example.org/grid#\" = \"\"\n").unwrap();
    let err = run_with_source(&Schema::default(), &ws.options(), &PythonTarget).unwrap_err();
    assert_eq!(err.stage(), "build");
}
