//! Coordinator behaviour against an in-memory parser.
//!
//! The fake parser serves documents from a map keyed by the path the
//! coordinator derives, and records every path it is asked for.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use hidl::hir::{Document, DocumentParser, ResolveFailure};
use hidl::{ConfigError, Coordinator, FqName, PackageRoots, ParseError, ResolveState};

#[derive(Clone, Debug)]
struct FakeDoc {
    package: FqName,
    interface: Option<String>,
    imports: Vec<FqName>,
    types: Vec<String>,
}

impl Document for FakeDoc {
    type Type = String;

    fn package(&self) -> &FqName {
        &self.package
    }

    fn interface_name(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    fn imports(&self) -> &[FqName] {
        &self.imports
    }

    fn lookup_type(&self, path: &str) -> Option<&String> {
        self.types.iter().find(|ty| ty.as_str() == path)
    }
}

#[derive(Default)]
struct FakeParser {
    files: HashMap<PathBuf, FakeDoc>,
    calls: Vec<PathBuf>,
}

impl DocumentParser for FakeParser {
    type Document = FakeDoc;

    fn parse(&mut self, path: &Path) -> Result<FakeDoc, ParseError> {
        self.calls.push(path.to_path_buf());
        self.files.get(path).cloned().ok_or_else(|| ParseError::Missing {
            path: path.to_path_buf(),
        })
    }
}

fn fq(text: &str) -> FqName {
    text.parse().unwrap()
}

fn roots() -> PackageRoots {
    PackageRoots::new([("p", "root")]).unwrap()
}

fn interface(package: &str, name: &str) -> FakeDoc {
    FakeDoc {
        package: fq(package),
        interface: Some(name.to_string()),
        imports: Vec::new(),
        types: vec![name.to_string()],
    }
}

fn types(package: &str, declared: &[&str]) -> FakeDoc {
    FakeDoc {
        package: fq(package),
        interface: None,
        imports: Vec::new(),
        types: declared.iter().map(|s| s.to_string()).collect(),
    }
}

fn imports(mut doc: FakeDoc, names: &[&str]) -> FakeDoc {
    doc.imports = names.iter().map(|n| fq(n)).collect();
    doc
}

/// Build a coordinator whose parser serves `files`, each stored under the
/// path derived from its requested name.
fn coordinator(files: Vec<(&str, FakeDoc)>) -> Coordinator<FakeParser> {
    let roots = roots();
    let mut parser = FakeParser::default();
    for (name, doc) in files {
        let path = roots.file_path(&fq(name)).unwrap();
        parser.files.insert(path, doc);
    }
    Coordinator::new(roots, parser)
}

fn assert_parsed_at_most_once(coordinator: &Coordinator<FakeParser>) {
    let calls = &coordinator.parser().calls;
    let mut seen = std::collections::HashSet::new();
    for call in calls {
        assert!(seen.insert(call), "{} parsed more than once", call.display());
    }
}

#[test]
fn test_resolve_twice_returns_same_document() {
    let mut coordinator = coordinator(vec![
        ("p.a@1.0::types", types("p.a@1.0", &["Status"])),
        ("p.a@1.0::IFoo", interface("p.a@1.0", "IFoo")),
    ]);

    let first = coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap().unwrap();
    let second = coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap().unwrap();

    assert_eq!(first, second);
    assert!(std::ptr::eq(coordinator.document(first), coordinator.document(second)));
    assert_eq!(coordinator.parser().calls.len(), 2);
    assert_parsed_at_most_once(&coordinator);
}

#[test]
fn test_nested_name_resolves_its_top_level_file() {
    let mut coordinator = coordinator(vec![("p.a@1.0::IFoo", interface("p.a@1.0", "IFoo"))]);

    let nested = coordinator.resolve(&fq("p.a@1.0::IFoo.Inner.Leaf")).unwrap();
    let top = coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap();

    assert!(nested.is_some());
    assert_eq!(nested, top);
    assert_eq!(coordinator.document_name(top.unwrap()), &fq("p.a@1.0::IFoo"));
}

#[test]
fn test_interface_first_attempts_package_types() {
    let mut coordinator = coordinator(vec![("p.a@1.0::IFoo", interface("p.a@1.0", "IFoo"))]);

    assert!(coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap().is_some());

    let calls = &coordinator.parser().calls;
    assert_eq!(calls[0], PathBuf::from("root/a/1.0/types.hal"));
    assert_eq!(calls[1], PathBuf::from("root/a/1.0/IFoo.hal"));

    // A package without a types file is fine.
    assert_eq!(coordinator.state(&fq("p.a@1.0::types")), ResolveState::Failed);
    assert!(matches!(
        coordinator.failure(&fq("p.a@1.0::types")),
        Some(ResolveFailure::Missing { .. })
    ));
}

#[test]
fn test_types_request_does_not_recurse_into_itself() {
    let mut coordinator = coordinator(vec![("p.a@1.0::types", types("p.a@1.0", &[]))]);

    assert!(coordinator.resolve(&fq("p.a@1.0::types")).unwrap().is_some());
    assert_eq!(coordinator.parser().calls.len(), 1);
}

#[test]
fn test_package_mismatch_is_not_found() {
    let mut coordinator = coordinator(vec![("p.a@1.0::IFoo", interface("p.b@1.0", "IFoo"))]);

    assert_eq!(coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap(), None);
    assert!(matches!(
        coordinator.failure(&fq("p.a@1.0::IFoo")),
        Some(ResolveFailure::PackageMismatch { expected, found, .. })
            if expected == &fq("p.a@1.0") && found == &fq("p.b@1.0")
    ));
}

#[test]
fn test_version_mismatch_is_not_found() {
    let mut coordinator = coordinator(vec![("p.a@1.0::IFoo", interface("p.a@1.1", "IFoo"))]);
    assert_eq!(coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap(), None);
}

#[test]
fn test_types_file_declaring_interface_is_not_found() {
    let mut coordinator = coordinator(vec![("p.a@1.0::types", interface("p.a@1.0", "IFoo"))]);

    assert_eq!(coordinator.resolve(&fq("p.a@1.0::types")).unwrap(), None);
    assert!(matches!(
        coordinator.failure(&fq("p.a@1.0::types")),
        Some(ResolveFailure::UnexpectedInterface { .. })
    ));
}

#[test]
fn test_interface_file_declaring_types_is_not_found() {
    let mut coordinator = coordinator(vec![("p.a@1.0::IFoo", types("p.a@1.0", &["IFoo"]))]);

    assert_eq!(coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap(), None);
    assert!(matches!(
        coordinator.failure(&fq("p.a@1.0::IFoo")),
        Some(ResolveFailure::ExpectedInterface { .. })
    ));
}

#[test]
fn test_interface_name_mismatch_is_not_found() {
    let mut coordinator = coordinator(vec![("p.a@1.0::IFoo", interface("p.a@1.0", "IBar"))]);

    assert_eq!(coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap(), None);
    assert!(matches!(
        coordinator.failure(&fq("p.a@1.0::IFoo")),
        Some(ResolveFailure::InterfaceMismatch { expected, found, .. })
            if expected == "IFoo" && found == "IBar"
    ));
}

#[test]
fn test_failed_key_is_not_parsed_again() {
    let mut coordinator = coordinator(vec![("p.a@1.0::IFoo", interface("p.a@1.0", "IBar"))]);

    assert_eq!(coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap(), None);
    assert_eq!(coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap(), None);
    assert_eq!(coordinator.parser().calls.len(), 2);
    assert_parsed_at_most_once(&coordinator);
}

#[test]
fn test_mutual_types_imports_terminate() {
    let mut coordinator = coordinator(vec![
        (
            "p.a@1.0::types",
            imports(types("p.a@1.0", &["A"]), &["p.b@1.0::types"]),
        ),
        (
            "p.b@1.0::types",
            imports(types("p.b@1.0", &["B"]), &["p.a@1.0::types"]),
        ),
        ("p.a@1.0::IFoo", interface("p.a@1.0", "IFoo")),
    ]);

    let foo = coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap();

    assert!(foo.is_some(), "non-cyclic part still resolves");
    assert_eq!(coordinator.resolve(&fq("p.a@1.0::types")).unwrap(), None);
    assert_eq!(coordinator.resolve(&fq("p.b@1.0::types")).unwrap(), None);
    assert!(matches!(
        coordinator.failure(&fq("p.b@1.0::types")),
        Some(ResolveFailure::CircularImport { import, .. }) if import == &fq("p.a@1.0::types")
    ));
    assert!(matches!(
        coordinator.failure(&fq("p.a@1.0::types")),
        Some(ResolveFailure::Import { import, .. }) if import == &fq("p.b@1.0::types")
    ));
    assert_parsed_at_most_once(&coordinator);
}

#[test]
fn test_self_import_terminates() {
    let mut coordinator = coordinator(vec![(
        "p.a@1.0::IFoo",
        imports(interface("p.a@1.0", "IFoo"), &["IFoo"]),
    )]);

    assert_eq!(coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap(), None);
    assert!(matches!(
        coordinator.failure(&fq("p.a@1.0::IFoo")),
        Some(ResolveFailure::CircularImport { .. })
    ));
}

#[test]
fn test_relative_import_uses_importer_package() {
    let mut coordinator = coordinator(vec![
        ("p.a@1.0::IFoo", imports(interface("p.a@1.0", "IFoo"), &["IBar"])),
        ("p.a@1.0::IBar", interface("p.a@1.0", "IBar")),
    ]);

    assert!(coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap().is_some());
    assert!(matches!(
        coordinator.state(&fq("p.a@1.0::IBar")),
        ResolveState::Resolved(_)
    ));
}

#[test]
fn test_import_of_types_member_falls_back_to_types_file() {
    let mut coordinator = coordinator(vec![
        (
            "p.a@1.0::IFoo",
            imports(interface("p.a@1.0", "IFoo"), &["p.b@1.0::Status"]),
        ),
        ("p.b@1.0::types", types("p.b@1.0", &["Status"])),
    ]);

    assert!(coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap().is_some());
    assert!(coordinator.get(&fq("p.b@1.0::types")).is_some());
    assert_eq!(coordinator.state(&fq("p.b@1.0::Status")), ResolveState::Failed);
}

#[test]
fn test_unresolvable_import_fails_importer_only() {
    let mut coordinator = coordinator(vec![
        (
            "p.a@1.0::IFoo",
            imports(interface("p.a@1.0", "IFoo"), &["p.b@1.0::IMissing"]),
        ),
        ("p.a@1.0::IBar", interface("p.a@1.0", "IBar")),
    ]);

    assert_eq!(coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap(), None);
    assert!(coordinator.resolve(&fq("p.a@1.0::IBar")).unwrap().is_some());
}

#[test]
fn test_lookup_type_in_interface_and_types() {
    let mut foo = interface("p.a@1.0", "IFoo");
    foo.types.push("IFoo.Bar".to_string());
    let mut coordinator = coordinator(vec![
        ("p.a@1.0::IFoo", foo),
        ("p.a@1.0::types", types("p.a@1.0", &["Status", "Pair.Inner"])),
    ]);
    let foo_id = coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap().unwrap();

    let nested = coordinator.lookup_type(&fq("p.a@1.0::IFoo.Bar")).unwrap().unwrap();
    assert_eq!(nested.document, foo_id);
    assert_eq!(nested.ty, "IFoo.Bar");

    let shared = coordinator.lookup_type(&fq("p.a@1.0::Pair.Inner")).unwrap().unwrap();
    assert_eq!(coordinator.document_name(shared.document), &fq("p.a@1.0::types"));

    assert!(coordinator.lookup_type(&fq("p.a@1.0::IFoo.Nope")).unwrap().is_none());
}

#[test]
fn test_lookup_type_never_parses() {
    let mut coordinator = coordinator(vec![
        ("p.a@1.0::IFoo", interface("p.a@1.0", "IFoo")),
        ("p.a@1.0::IBar", interface("p.a@1.0", "IBar")),
    ]);
    coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap();
    let calls = coordinator.parser().calls.len();

    assert!(coordinator.lookup_type(&fq("p.a@1.0::IBar")).unwrap().is_none());
    assert_eq!(coordinator.parser().calls.len(), calls);
    assert_eq!(coordinator.state(&fq("p.a@1.0::IBar")), ResolveState::Unseen);
}

#[test]
fn test_lookup_type_requires_full_name() {
    let coordinator = coordinator(vec![]);
    assert!(matches!(
        coordinator.lookup_type(&fq("IFoo.Bar")),
        Err(ConfigError::NotFullyQualified(_))
    ));
}

#[test]
fn test_for_each_document_visits_resolved_only() {
    let mut coordinator = coordinator(vec![
        ("p.a@1.0::IFoo", interface("p.a@1.0", "IFoo")),
        ("p.a@1.0::IBar", interface("p.a@1.0", "IBar")),
        ("p.a@1.0::IBad", interface("p.a@1.0", "IOther")),
    ]);
    for name in ["p.a@1.0::IFoo", "p.a@1.0::IBad", "p.a@1.0::IBar"] {
        coordinator.resolve(&fq(name)).unwrap();
    }

    let mut visited = Vec::new();
    coordinator
        .for_each_document(|name, doc| {
            visited.push((name.to_string(), doc.interface.clone()));
            Ok::<(), ()>(())
        })
        .unwrap();

    assert_eq!(
        visited,
        vec![
            ("p.a@1.0::IFoo".to_string(), Some("IFoo".to_string())),
            ("p.a@1.0::IBar".to_string(), Some("IBar".to_string())),
        ]
    );
}

#[test]
fn test_for_each_document_stops_at_first_error() {
    let mut coordinator = coordinator(vec![
        ("p.a@1.0::IFoo", interface("p.a@1.0", "IFoo")),
        ("p.a@1.0::IBar", interface("p.a@1.0", "IBar")),
        ("p.a@1.0::IBaz", interface("p.a@1.0", "IBaz")),
    ]);
    for name in ["p.a@1.0::IFoo", "p.a@1.0::IBar", "p.a@1.0::IBaz"] {
        coordinator.resolve(&fq(name)).unwrap();
    }

    let mut visited = 0;
    let result = coordinator.for_each_document(|name, _| {
        visited += 1;
        if name.name() == "IBar" {
            Err(name.clone())
        } else {
            Ok(())
        }
    });

    assert_eq!(result, Err(fq("p.a@1.0::IBar")));
    assert_eq!(visited, 2);
}

#[test]
fn test_not_fully_qualified_request_is_rejected() {
    let mut coordinator = coordinator(vec![]);
    assert!(matches!(
        coordinator.resolve(&fq("p.a@1.0")),
        Err(ConfigError::NotFullyQualified(_))
    ));
    assert!(coordinator.is_empty());
}

#[test]
fn test_unknown_package_root_aborts() {
    let mut coordinator = coordinator(vec![]);

    let err = coordinator.resolve(&fq("q.a@1.0::IFoo")).unwrap_err();

    assert_eq!(err, ConfigError::NoPackageRoot { package: "q.a".into() });
    assert!(coordinator.parser().calls.is_empty());
    assert_eq!(coordinator.state(&fq("q.a@1.0::IFoo")), ResolveState::Failed);
    assert!(matches!(
        coordinator.failure(&fq("q.a@1.0::types")),
        Some(ResolveFailure::Config(_))
    ));
}

#[test]
fn test_configuration_error_repeats_on_every_request() {
    let mut coordinator = coordinator(vec![]);
    let expected = ConfigError::NoPackageRoot { package: "q.a".into() };

    assert_eq!(coordinator.resolve(&fq("q.a@1.0::IFoo")), Err(expected.clone()));
    assert_eq!(coordinator.resolve(&fq("q.a@1.0::IFoo")), Err(expected.clone()));
    assert_eq!(coordinator.resolve(&fq("q.a@1.0::IFoo.Nested")), Err(expected));
    assert!(coordinator.parser().calls.is_empty());
}

#[test]
fn test_import_of_misconfigured_name_surfaces_error() {
    let mut coordinator = coordinator(vec![(
        "p.a@1.0::IFoo",
        imports(interface("p.a@1.0", "IFoo"), &["q.a@1.0::IBar"]),
    )]);
    let expected = ConfigError::NoPackageRoot { package: "q.a".into() };

    assert_eq!(coordinator.resolve(&fq("q.a@1.0::IBar")), Err(expected.clone()));
    assert_eq!(coordinator.resolve(&fq("p.a@1.0::IFoo")), Err(expected));
    assert!(matches!(
        coordinator.failure(&fq("p.a@1.0::IFoo")),
        Some(ResolveFailure::Config(_))
    ));
}

#[test]
fn test_diagnostics_describe_failures() {
    let mut coordinator = coordinator(vec![(
        "p.a@1.0::IFoo",
        imports(interface("p.a@1.0", "IFoo"), &["IMissing"]),
    )]);
    coordinator.resolve(&fq("p.a@1.0::IFoo")).unwrap();

    let diagnostics = coordinator.diagnostics();
    let foo = diagnostics
        .iter()
        .find(|d| d.message.contains("'p.a@1.0::IFoo'"))
        .unwrap();
    assert_eq!(foo.code.as_deref(), Some(hidl::hir::diagnostics::codes::UNRESOLVED_IMPORT));
    assert_eq!(foo.related.len(), 1);
    assert!(foo.related[0].message.contains("IMissing.hal"));

    // Two missing files (types, IMissing) and the failed importer.
    assert_eq!(diagnostics.len(), 3);
    assert_eq!(diagnostics.warning_count(), 2);
    assert_eq!(diagnostics.error_count(), 1);
    assert!(diagnostics.has_errors());
    assert_eq!(
        diagnostics.diagnostics_for_path(Path::new("root/a/1.0/IFoo.hal")).len(),
        1
    );
}

#[test]
fn test_foreign_document_id_is_rejected() {
    let mut owner = coordinator(vec![
        ("p.a@1.0::types", types("p.a@1.0", &[])),
        ("p.a@1.0::IFoo", interface("p.a@1.0", "IFoo")),
    ]);
    let id = owner.resolve(&fq("p.a@1.0::IFoo")).unwrap().unwrap();
    let other = coordinator(vec![]);

    assert!(owner.try_document(id).is_some());
    assert!(other.try_document(id).is_none());
}

#[test]
#[should_panic(expected = "was not issued by this coordinator")]
fn test_foreign_document_id_panics_on_access() {
    let mut owner = coordinator(vec![("p.a@1.0::types", types("p.a@1.0", &[]))]);
    let id = owner.resolve(&fq("p.a@1.0::types")).unwrap().unwrap();
    let other = coordinator(vec![]);

    other.document_path(id);
}
