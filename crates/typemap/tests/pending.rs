pub mod fixtures;

use fixtures::*;
use std::sync::Arc;
use tessera_typemap::{Definition, FetchOptions, PreventRegister, TypeMap, TypeMapError};

#[test]
fn test_postponed_entities_register_on_first_lookup() {
    let map = TypeMap::new();
    let color = color();
    map.postpone_registration(Arc::clone(&color));
    assert_eq!(map.summary().pending, 1);
    assert_eq!(map.objects(), 0);

    let found = map.resolve("colour", &types()).unwrap();

    assert!(Arc::ptr_eq(&found, &color));
    assert_eq!(map.summary().pending, 0);
    assert_eq!(map.objects(), 1);
}

#[test]
fn test_already_registered_entities_are_dropped_from_the_queue() {
    let map = TypeMap::new();
    let color = map.register(color()).unwrap();
    map.postpone_registration(Arc::clone(&color));
    assert_eq!(map.summary().pending, 0, "registered entities are never queued");

    let int = Definition::builder("int", "Int").build();
    map.postpone_registration(Arc::clone(&int));
    map.register(int).unwrap();
    map.fetch("color", &types()).unwrap();

    assert_eq!(map.summary().pending, 0);
    assert_eq!(map.objects(), 2);
}

#[test]
fn test_flush_failure_reports_origin_and_keeps_the_rest_queued() {
    let map = TypeMap::new();
    let first = Definition::builder("int", "Int").build();
    let broken = Definition::builder("user", "User")
        .validate(|_, _| Err(TypeMapError::definition("field `id` defined twice")))
        .build();
    let last = Definition::builder("string", "String").build();

    map.postpone_registration(Arc::clone(&first));
    let line = line!() + 1;
    map.postpone_registration(Arc::clone(&broken));
    map.postpone_registration(Arc::clone(&last));

    let err = map.fetch("string", &types()).unwrap_err();

    assert!(matches!(err, TypeMapError::Definition { .. }));
    let message = err.to_string();
    assert!(message.contains("field `id` defined twice"));
    assert!(message.contains(&format!("Defined at: {}:{line}", file!())), "{message}");

    assert!(first.is_registered(), "entities flushed before the failure stay registered");
    assert!(!broken.is_registered());
    assert!(!last.is_registered());
    assert_eq!(map.summary().pending, 1);

    assert_eq!(map.resolve("string", &types()).unwrap().name(), "String");
}

#[test]
fn test_skipped_entities_are_requeued() {
    let map = TypeMap::new();
    let color = color();
    let int = Definition::builder("int", "Int").build();
    map.postpone_registration(Arc::clone(&color));
    map.postpone_registration(Arc::clone(&int));

    let options = types().skip_registration_of(Arc::clone(&color));
    assert!(map.fetch("color", &options).unwrap().is_none());

    assert!(int.is_registered());
    assert!(!color.is_registered());
    assert_eq!(map.summary().pending, 1);

    assert!(map.fetch("color", &types()).unwrap().is_some());
}

#[test]
fn test_suppressed_lookups_leave_the_queue_alone() {
    let map = TypeMap::new();
    map.postpone_registration(color());

    let options = types().prevent_register(PreventRegister::Suppress);
    assert!(map.fetch("color", &options).unwrap().is_none());
    assert_eq!(map.summary().pending, 1);
}

#[test]
fn test_skip_sets_apply_to_nested_lookups() {
    let map = TypeMap::new();
    let color = color();
    let palette = Definition::builder("palette", "Palette")
        .validate(|_, map| {
            // A nested lookup while `color` is still being resolved by the caller.
            map.fetch("int", &types()).map(|_| ())
        })
        .build();

    map.postpone_registration(Arc::clone(&palette));
    map.postpone_registration(Arc::clone(&color));

    let options = FetchOptions::new().skip_registration_of(Arc::clone(&color));
    assert!(map.fetch("palette", &options).unwrap().is_some());

    assert!(!color.is_registered(), "the nested flush must honor the outer skip set");
    assert_eq!(map.summary().pending, 1);
}
