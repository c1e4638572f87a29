//! A small demo catalog: scalars in `base`, a lazily loaded `mysql` namespace and a few
//! aliases. Used when the shell runs without `--bare`.

use tessera::typemap::{AliasTarget, Category, Definition, Dependency, FetchOptions, TypeMap, TypeMapError};

const SCALARS: [(&str, &str); 5] =
    [("int", "Int"), ("float", "Float"), ("string", "String"), ("boolean", "Boolean"), ("id", "ID")];

/// Registers the demo catalog into `map`.
///
/// # Errors
/// Propagates registration failures.
pub fn seed(map: &TypeMap) -> Result<(), TypeMapError> {
    for (key, name) in SCALARS {
        map.register(Definition::builder(key, name).build())?;
    }
    map.register(Definition::builder("bool", "Bool").alias("tinyint(1)").build())?;
    map.register(
        Definition::builder("deprecated", "deprecated").category(Category::Directive).build(),
    )?;

    map.register_alias("integer", AliasTarget::Key("int".into()), &FetchOptions::new())?;

    map.add_dependencies("mysql", [Dependency::loader(load_mysql)]);
    Ok(())
}

fn load_mysql(map: &TypeMap) -> Result<(), TypeMapError> {
    for (key, name) in [("tinyint", "TinyInt"), ("bigint", "BigInt"), ("json", "Json")] {
        map.register(Definition::builder(key, name).namespace("mysql").build())?;
    }
    map.register(
        Definition::builder("enum", "Enum").namespace("mysql").namespace("pg").alias("set").build(),
    )?;

    let mysql = FetchOptions::new().namespace("mysql");
    map.register_alias("varchar", AliasTarget::Key("string".into()), &mysql)?;
    map.register_alias(
        "text",
        AliasTarget::resolver(|map| map.fetch("string", &FetchOptions::new()).ok().flatten()),
        &mysql,
    )?;
    Ok(())
}
