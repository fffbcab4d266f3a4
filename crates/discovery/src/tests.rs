use crate::config::DiscoveryConfigBuilder;
use crate::context::DiscoveryContext;
use crate::errors::DiscoveryError;
use crate::key::ClassKey;
use crate::loader::LoadOutcome;
use class_cache::SnapshotStore;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing_test::traced_test;

struct Fixture {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    fn dir(&self, name: &str) -> PathBuf {
        let path = self.root.join(name);
        fs::create_dir_all(&path).unwrap();
        path
    }

    fn source(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("<?php\n\n{content}\n")).unwrap();
        path
    }

    fn cache_root(&self) -> PathBuf {
        self.root.join("cache")
    }

    fn uncached(&self, paths: &[&Path]) -> DiscoveryContext {
        let config = DiscoveryConfigBuilder::new()
            .paths(paths.iter().copied())
            .use_cache(false)
            .build()
            .unwrap();
        DiscoveryContext::from_config(config).unwrap()
    }

    fn cached(&self, paths: &[&Path]) -> DiscoveryContext {
        let config = DiscoveryConfigBuilder::new()
            .paths(paths.iter().copied())
            .cache_root(self.cache_root())
            .build()
            .unwrap();
        DiscoveryContext::from_config(config).unwrap()
    }
}

fn declared(context: &DiscoveryContext, key: &ClassKey) -> String {
    context.registry().display_name(key)
}

#[test]
fn test_names_are_case_insensitive() {
    let fixture = Fixture::new();
    let src = fixture.dir("src");
    fixture.source("src/HttpKernel.php", "class HttpKernel {}");

    let mut context = fixture.uncached(&[&src]);
    context.initialize().unwrap();

    assert_eq!(ClassKey::new("HttpKernel"), ClassKey::new("HTTPKERNEL"));
    for spelling in ["HttpKernel", "httpkernel", "HTTPKERNEL", "hTtPkErNeL"] {
        let entry = context.resolve(spelling, None).unwrap();
        assert_eq!(entry.declared_name, "HttpKernel");
    }
}

#[test]
fn test_case_variants_in_two_files_are_duplicates() {
    let fixture = Fixture::new();
    let src = fixture.dir("src");
    fixture.source("src/a/Widget.php", "class Widget {}");
    fixture.source("src/b/WIDGET.php", "class WIDGET {}");

    let mut context = fixture.uncached(&[&src]);
    match context.initialize().unwrap_err() {
        DiscoveryError::DuplicateDeclaration { key, first, second } => {
            assert_eq!(key, "Widget");
            assert!(first.ends_with("a/Widget.php"));
            assert!(second.ends_with("b/WIDGET.php"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_rescanning_unchanged_tree_is_idempotent() {
    let fixture = Fixture::new();
    let src = fixture.dir("src");
    fixture.source("src/A.php", "class A {}");
    fixture.source("src/B.php", "class B extends A {}");
    fixture.source("src/Pair.php", "interface Pairable {}\nclass Pair extends B implements Pairable {}");

    let mut context = fixture.uncached(&[&src]);
    context.scan_paths().unwrap();
    context.build_inheritance().unwrap();
    let registry = context.registry().clone();
    let inheritance = context.inheritance().clone();

    context.scan_paths().unwrap();
    context.build_inheritance().unwrap();

    assert_eq!(context.registry(), &registry);
    assert_eq!(context.inheritance(), &inheritance);
    assert_eq!(registry.len(), 4);
}

#[test]
fn test_single_override() {
    let fixture = Fixture::new();
    let framework = fixture.dir("framework");
    let app = fixture.dir("app");
    fixture.source("framework/Session.php", "class Session {}");
    fixture.source("app/AppSession.php", "class AppSession extends Session {}");

    let mut context = fixture.uncached(&[&framework, &app]);
    context.initialize().unwrap();

    let best = context.resolve_best("Session", None).unwrap();
    assert_eq!(declared(&context, &best), "AppSession");
    assert_eq!(
        context.resolve_exact("Session", None).unwrap(),
        ClassKey::new("Session")
    );
}

#[test]
fn test_chained_override() {
    let fixture = Fixture::new();
    let src = fixture.dir("src");
    fixture.source("src/A.php", "class A {}");
    fixture.source("src/B.php", "class B extends A {}");
    fixture.source("src/C.php", "class C extends B {}");

    let mut context = fixture.uncached(&[&src]);
    context.initialize().unwrap();

    assert_eq!(context.resolve_best("A", None).unwrap(), ClassKey::new("C"));
    assert_eq!(context.resolve_best("B", None).unwrap(), ClassKey::new("C"));
    assert!(context.is_subclass_of("C", "A"));
    assert!(!context.is_subclass_of("A", "C"));
}

#[test]
fn test_divergence_names_both_branches() {
    let fixture = Fixture::new();
    let src = fixture.dir("src");
    fixture.source("src/A.php", "class A {}");
    fixture.source("src/B.php", "class B extends A {}");
    fixture.source("src/C.php", "class C extends A {}");

    let mut context = fixture.uncached(&[&src]);
    context.initialize().unwrap();

    let error = context.resolve_best("A", None).unwrap_err();
    match &error {
        DiscoveryError::DivergentOverride { base, branches } => {
            assert_eq!(base, "A");
            assert_eq!(branches, &vec!["B".to_string(), "C".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let message = error.to_string();
    assert!(message.contains("`A`"));
    assert!(message.contains("B, C"));
}

#[test]
fn test_required_ancestor() {
    let fixture = Fixture::new();
    let src = fixture.dir("src");
    fixture.source("src/Chain.php", "class A {}\nclass B extends A {}\nclass C extends B {}");
    fixture.source("src/D.php", "class D {}");

    let mut context = fixture.uncached(&[&src]);
    context.initialize().unwrap();

    assert_eq!(
        context.resolve_best("B", Some("A")).unwrap(),
        ClassKey::new("C")
    );
    assert!(matches!(
        context.resolve_exact("D", Some("A")),
        Err(DiscoveryError::NotFound { .. })
    ));
    assert_eq!(
        context.resolve_exact("D", Some("A")).unwrap_err().to_string(),
        "no registered class `D` descending from `A`"
    );
}

#[test]
fn test_snapshot_round_trip() {
    let fixture = Fixture::new();
    let src = fixture.dir("src");
    fixture.source("src/Bootstrap.php", "abstract class Bootstrap {}");
    fixture.source("src/CoreBootstrap.php", "class CoreBootstrap extends Bootstrap {}");
    fixture.source("src/Shape.php", "interface Shape {}\nclass Square implements Shape {}");

    let mut first = fixture.cached(&[&src]);
    assert!(!first.initialize().unwrap().from_cache);

    let mut second = fixture.cached(&[&src]);
    let stats = second.initialize().unwrap();
    assert!(stats.from_cache);
    assert_eq!(stats.total_classes, 4);

    assert_eq!(second.registry(), first.registry());
    assert_eq!(second.inheritance(), first.inheritance());
    assert_eq!(second.startup_classes(), first.startup_classes());
    assert_eq!(second.startup_classes(), ["corebootstrap"]);

    // Loading still works without a scan
    let square = second.load_class("square").descriptor().unwrap();
    assert_eq!(square.interfaces, vec!["Shape"]);
}

#[test]
fn test_changed_path_list_is_a_cache_miss() {
    let fixture = Fixture::new();
    let framework = fixture.dir("framework");
    let plugins = fixture.dir("plugins");
    fixture.source("framework/Mailer.php", "class Mailer {}");
    fixture.source("plugins/SmtpMailer.php", "class SmtpMailer extends Mailer {}");

    let mut context = fixture.cached(&[&framework]);
    context.initialize().unwrap();
    assert_eq!(
        context.resolve_best("Mailer", None).unwrap(),
        ClassKey::new("Mailer")
    );

    let mut context = fixture.cached(&[&framework, &plugins]);
    assert!(!context.initialize().unwrap().from_cache);
    assert_eq!(
        context.resolve_best("Mailer", None).unwrap(),
        ClassKey::new("SmtpMailer")
    );

    // Same directories in another order are a different lookup path
    let mut context = fixture.cached(&[&plugins, &framework]);
    assert!(!context.initialize().unwrap().from_cache);
}

#[test]
fn test_cache_keys_are_separate() {
    let fixture = Fixture::new();
    let src = fixture.dir("src");
    fixture.source("src/Page.php", "class Page {}");

    let build = |environment: &str| {
        let config = DiscoveryConfigBuilder::new()
            .path(&src)
            .environment(environment)
            .cache_root(fixture.cache_root())
            .build()
            .unwrap();
        DiscoveryContext::from_config(config).unwrap()
    };

    assert!(!build("development").initialize().unwrap().from_cache);
    assert!(!build("production").initialize().unwrap().from_cache);
    assert!(build("production").initialize().unwrap().from_cache);

    let store = SnapshotStore::new_with_directory(fixture.cache_root(), crate::FRAMEWORK_VERSION)
        .unwrap();
    assert_eq!(store.list().unwrap().len(), 2);

    assert!(build("production").invalidate_cache().unwrap());
    assert!(!build("production").initialize().unwrap().from_cache);
    assert_eq!(build("development").wipe_cache().unwrap(), 2);
}

#[test]
fn test_widget_override_then_divergence() {
    let fixture = Fixture::new();
    let framework = fixture.dir("framework");
    let app = fixture.dir("app");
    let plugin = fixture.dir("plugin");
    fixture.source("framework/Widget.php", "class Widget {}");
    fixture.source("app/SpecialWidget.php", "class SpecialWidget extends Widget {}");

    let mut context = fixture.cached(&[&framework, &app, &plugin]);
    context.initialize().unwrap();
    let entry = context.resolve("Widget", None).unwrap();
    assert_eq!(entry.declared_name, "SpecialWidget");
    assert!(entry.source_path.ends_with("app/SpecialWidget.php"));

    // A new plugin class only shows up once the snapshot is dropped
    fixture.source("plugin/OtherWidget.php", "class OtherWidget extends Widget {}");
    let mut context = fixture.cached(&[&framework, &app, &plugin]);
    assert!(context.initialize().unwrap().from_cache);
    assert!(context.resolve("Widget", None).is_ok());

    assert!(context.invalidate_cache().unwrap());
    context.initialize().unwrap();
    let message = context.resolve("Widget", None).unwrap_err().to_string();
    assert!(message.contains("SpecialWidget"));
    assert!(message.contains("OtherWidget"));
}

#[test]
fn test_unregistered_framework_base() {
    let fixture = Fixture::new();
    let app = fixture.dir("app");
    fixture.source(
        "app/Errors.php",
        "namespace App\\Errors;\n\nclass NotFoundError extends \\Framework\\HttpError {}",
    );

    let mut context = fixture.uncached(&[&app]);
    context.initialize().unwrap();

    assert_eq!(
        context.resolve_best("HttpError", None).unwrap(),
        ClassKey::new("NotFoundError")
    );
    assert!(context.resolve_exact("HttpError", None).is_err());
    assert_eq!(context.load_class("HttpError"), LoadOutcome::NotFound);
}

#[test]
fn test_missing_directory_is_a_warning() {
    let fixture = Fixture::new();
    let src = fixture.dir("src");
    fixture.source("src/Cart.php", "class Cart {}");
    let missing = fixture.root.join("not-there");

    let mut context = fixture.uncached(&[&src, &missing]);
    let stats = context.initialize().unwrap();

    assert_eq!(stats.total_classes, 1);
    assert_eq!(stats.directories.len(), 2);
    assert!(!stats.warnings.is_empty());
}

#[test]
fn test_cyclic_declarations_fail_indexing() {
    let fixture = Fixture::new();
    let src = fixture.dir("src");
    fixture.source("src/Loop.php", "class Ping extends Pong {}\nclass Pong extends Ping {}");

    let mut context = fixture.uncached(&[&src]);
    assert!(matches!(
        context.initialize(),
        Err(DiscoveryError::InheritanceCycle { .. })
    ));
}

#[test]
#[traced_test]
fn test_inconsistent_snapshot_is_rebuilt() {
    let fixture = Fixture::new();
    let src = fixture.dir("src");
    fixture.source("src/Widget.php", "class Widget {}");
    fixture.source("src/SpecialWidget.php", "class SpecialWidget extends Widget {}");

    let mut first = fixture.cached(&[&src]);
    assert!(!first.initialize().unwrap().from_cache);

    let store = SnapshotStore::new_with_directory(fixture.cache_root(), crate::FRAMEWORK_VERSION)
        .unwrap();
    let snapshot_path = store.snapshot_path(&first.cache_key());
    let saved = fs::read_to_string(&snapshot_path).unwrap();
    assert!(saved.contains("\"kind\": \"class\""));
    fs::write(&snapshot_path, saved.replace("\"kind\": \"class\"", "\"kind\": \"enum\"")).unwrap();

    let mut second = fixture.cached(&[&src]);
    let stats = second.initialize().unwrap();
    assert!(!stats.from_cache);
    assert_eq!(stats.total_classes, 2);
    assert_eq!(second.resolve("widget", None).unwrap().declared_name, "SpecialWidget");
    assert!(logs_contain("Discarding inconsistent snapshot"));

    let mut third = fixture.cached(&[&src]);
    assert!(third.initialize().unwrap().from_cache);
}

#[test]
fn test_changed_scan_settings_miss_the_cache() {
    let fixture = Fixture::new();
    let src = fixture.dir("src");
    fixture.source("src/Kernel.php", "class Kernel {}");
    fixture.source("src/AppKernel.php", "class AppKernel extends Kernel {}");
    fixture.source("src/Legacy.inc", "class Legacy {}");

    let build = |extensions: &[&str], startup_base: &str| {
        let config = DiscoveryConfigBuilder::new()
            .paths([src.as_path()])
            .cache_root(fixture.cache_root())
            .extensions(extensions.iter().copied())
            .startup_base(startup_base)
            .build()
            .unwrap();
        DiscoveryContext::from_config(config).unwrap()
    };

    let mut php_only = build(&["php"], "Kernel");
    assert!(!php_only.initialize().unwrap().from_cache);
    assert!(php_only.resolve("Legacy", None).is_err());
    assert_eq!(php_only.startup_classes().to_vec(), vec!["AppKernel".to_string()]);

    let mut with_inc = build(&["php", "inc"], "Kernel");
    assert!(!with_inc.initialize().unwrap().from_cache);
    assert_eq!(with_inc.resolve("Legacy", None).unwrap().declared_name, "Legacy");

    let mut other_base = build(&["php", "inc"], "Legacy");
    assert!(!other_base.initialize().unwrap().from_cache);
    assert!(other_base.startup_classes().is_empty());

    let mut again = build(&["php", "inc"], "Legacy");
    assert!(again.initialize().unwrap().from_cache);
}

#[test]
fn test_repeated_scan_records_each_directory_once() {
    let fixture = Fixture::new();
    let src = fixture.dir("src");
    fixture.source("src/A.php", "class A {}");
    fixture.source("src/B.php", "class B extends A {}");

    let mut context = fixture.uncached(&[&src]);
    context.scan_paths().unwrap();
    context.scan_paths().unwrap();

    let resolved = dunce::canonicalize(&src).unwrap();
    assert_eq!(context.scanned_paths(), &[resolved.clone()]);
    assert_eq!(context.statistics().directories.len(), 1);
    assert_eq!(context.statistics().directories[0].files_scanned, 2);
    assert_eq!(context.registry().len(), 2);
    assert_eq!(context.snapshot().scanned_paths, vec![resolved]);
}

#[test]
fn test_dotted_scopes_keep_separate_snapshots() {
    let fixture = Fixture::new();
    let framework = fixture.dir("framework");
    let app = fixture.dir("app");
    fixture.source("framework/Widget.php", "class Widget {}");
    fixture.source("app/SpecialWidget.php", "class SpecialWidget extends Widget {}");

    let build = |controller_set: &str, environment: &str, paths: &[&Path]| {
        let config = DiscoveryConfigBuilder::new()
            .paths(paths.iter().copied())
            .cache_root(fixture.cache_root())
            .controller_set(controller_set)
            .environment(environment)
            .build()
            .unwrap();
        DiscoveryContext::from_config(config).unwrap()
    };

    let mut left = build("admin.v2", "prod", &[&framework]);
    let mut right = build("admin", "v2.prod", &[&framework, &app]);
    assert_ne!(left.cache_key(), right.cache_key());
    assert!(!left.initialize().unwrap().from_cache);
    assert!(!right.initialize().unwrap().from_cache);

    let mut left_again = build("admin.v2", "prod", &[&framework]);
    assert!(left_again.initialize().unwrap().from_cache);
    assert_eq!(left_again.resolve("Widget", None).unwrap().declared_name, "Widget");
}
