pub mod fixtures;

use fixtures::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tessera_typemap::{
    AliasTarget, Category, Definition, Dependency, EntityRef, FetchOptions, Namespace,
    SourceLoader, Symbol, TypeMap, TypeMapConfig, TypeMapError,
};

#[test]
fn test_requested_namespaces_are_searched_before_base() {
    let map = TypeMap::new();
    map.register(Definition::builder("json", "BaseJson").build()).unwrap();
    map.register(Definition::builder("json", "MysqlJson").namespace("mysql").build()).unwrap();

    assert_eq!(map.resolve("json", &types().namespace("mysql")).unwrap().name(), "MysqlJson");
    assert_eq!(map.resolve("json", &types().namespace("pg")).unwrap().name(), "BaseJson");
    assert!(map.fetch("json", &types().namespace("pg").exclusive(true)).unwrap().is_none());
}

#[test]
fn test_namespace_loop_is_outer_and_key_loop_is_inner() {
    let map = TypeMap::new();
    map.register(Definition::builder("text", "MysqlText").namespace("mysql").build()).unwrap();
    map.register(Definition::builder("string", "String").build()).unwrap();
    map.register(Definition::builder("string", "MysqlString").namespace("mysql").build()).unwrap();

    let options = types().namespace("mysql").fallback("string");

    // `varchar` is missing everywhere: the fallback is tried in `mysql` before `base`.
    assert_eq!(map.fetch("varchar", &options).unwrap().unwrap().name(), "MysqlString");
    assert_eq!(map.fetch("text", &options).unwrap().unwrap().name(), "MysqlText");
}

#[test]
fn test_fallback_is_reported_once_per_missing_key() {
    let map = seeded_map();
    let options = types().fallback("string");

    let (first, logs) = with_captured_logs(|| map.resolve("unknown_scalar", &options));
    assert_eq!(first.unwrap().name(), "String");
    let output = logs.contents();
    assert_eq!(output.matches("Missing entity replaced by fallback").count(), 1);
    assert!(output.contains("unknown_scalar"));

    let (second, logs) = with_captured_logs(|| map.resolve("unknown_scalar", &options));
    assert_eq!(second.unwrap().name(), "String");
    assert!(logs.contents().is_empty());

    assert_eq!(map.fallback_reports(), [(Category::Type, Symbol::from("unknown_scalar"))]);
}

#[test]
fn test_fallback_reporting_can_be_silenced() {
    let map = TypeMap::with_config(TypeMapConfig { report_fallbacks: false, ..TypeMapConfig::default() });
    map.register(Definition::builder("string", "String").build()).unwrap();

    let (found, logs) = with_captured_logs(|| map.resolve("uuid", &types().fallback("string")));

    assert_eq!(found.unwrap().name(), "String");
    assert!(logs.contents().is_empty());
    assert_eq!(map.fallback_reports().len(), 1);
}

#[test]
fn test_missing_key_without_fallback_is_not_found() {
    let map = seeded_map();
    let err = map.resolve("uuid", &types()).unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Unable to find Type `uuid`");
}

#[test]
fn test_dependencies_load_once_on_first_miss() {
    let map = TypeMap::new();
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    map.add_dependencies(
        "base",
        [Dependency::loader(move |map| {
            counter.fetch_add(1, Ordering::SeqCst);
            map.register(Definition::builder("int", "Int").build()).map(|_| ())
        })],
    );

    assert!(map.fetch("int", &types()).unwrap().is_none(), "fetch never loads dependencies");
    assert_eq!(map.resolve("int", &types()).unwrap().name(), "Int");
    assert_eq!(map.resolve("int", &types()).unwrap().name(), "Int");
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(map.summary().dependencies, [(Namespace::base(), 0)]);
}

#[test]
fn test_unregistered_keys_do_not_trigger_dependency_loading() {
    let map = TypeMap::new();
    let color = map.register(color()).unwrap();
    map.unregister(&[color]).unwrap();
    map.add_dependencies(
        "base",
        [Dependency::loader(|map| map.register(super_color()).map(|_| ()))],
    );

    assert!(map.resolve("color", &types()).unwrap_err().is_not_found());
    assert_eq!(map.summary().dependencies, [(Namespace::base(), 1)]);
}

fn super_color() -> EntityRef {
    Definition::builder("color", "SuperColor").build()
}

#[test]
fn test_failing_dependency_keeps_later_units_queued() {
    let map = TypeMap::new();
    map.add_dependencies(
        "base",
        [
            Dependency::loader(|_| Err(TypeMapError::definition("broken scalar"))),
            Dependency::loader(|map| map.register(Definition::builder("int", "Int").build()).map(|_| ())),
        ],
    );

    let err = map.resolve("int", &types()).unwrap_err();
    assert!(matches!(err, TypeMapError::Definition { .. }));
    assert!(err.to_string().contains("While loading dependencies of `base`"));

    assert_eq!(map.resolve("int", &types()).unwrap().name(), "Int");
}

#[test]
fn test_source_dependency_without_loader_fails() {
    let map = TypeMap::new();
    map.add_dependencies("base", [Dependency::source("schema/scalars.graphql")]);

    let err = map.resolve("int", &types()).unwrap_err();

    assert!(matches!(err, TypeMapError::LoadFailed { .. }));
    assert!(err.to_string().contains("schema/scalars.graphql"));
}

/// Registers a `pg` scalar named after the last locator segment.
#[derive(Debug)]
struct ScalarLoader;

impl SourceLoader for ScalarLoader {
    fn load(&self, locator: &str, map: &TypeMap) -> Result<(), TypeMapError> {
        let name = locator.rsplit('/').next().unwrap_or(locator);
        map.register(Definition::builder(name.to_lowercase(), name).namespace("pg").build())
            .map(|_| ())
    }
}

#[test]
fn test_source_dependency_goes_through_the_loader() {
    let map = TypeMap::new().with_source_loader(Arc::new(ScalarLoader));
    map.add_dependencies("pg", [Dependency::source("scalars/Inet")]);

    let found = map.resolve("inet", &types().namespace("pg")).unwrap();

    assert_eq!(found.name(), "Inet");
}

#[test]
fn test_dependency_namespaces_are_searched_without_a_filter() {
    let map = TypeMap::new();
    map.add_dependencies(
        "mysql",
        [Dependency::loader(|map| {
            map.register(Definition::builder("tinyint", "TinyInt").namespace("mysql").build())
                .map(|_| ())
        })],
    );

    assert_eq!(map.resolve("tinyint", &types()).unwrap().name(), "TinyInt");
}

#[test]
fn test_exists_checks_do_not_flush_pending() {
    let map = TypeMap::new();
    let color = color();
    map.postpone_registration(Arc::clone(&color));

    assert!(!map.exists("color", &types()).unwrap());
    assert!(!map.object_exists(color.as_ref()).unwrap());
    assert!(!color.is_registered());

    assert!(map.fetch("color", &types()).unwrap().is_some());
    assert!(map.exists("color", &types()).unwrap());
    assert!(map.object_exists(color.as_ref()).unwrap());
}

#[test]
fn test_object_exists_uses_entity_namespaces() {
    let map = TypeMap::new();
    let json = map.register(Definition::builder("json", "JSON").namespace("mysql").build()).unwrap();
    let stray = Definition::builder("json", "JSON").namespace("pg").build();

    assert!(map.object_exists(json.as_ref()).unwrap());
    assert!(!map.object_exists(stray.as_ref()).unwrap());
    assert!(!map.exists("json", &FetchOptions::new().namespace("pg").exclusive(true)).unwrap());
}

#[test]
fn test_resolver_returning_nothing_continues_the_search() {
    let map = seeded_map();
    map.register_alias(
        "int",
        AliasTarget::resolver(|_| None),
        &types().namespace("mysql"),
    )
    .unwrap();

    assert_eq!(map.resolve("int", &types().namespace("mysql")).unwrap().name(), "Int");
}
