use clap::Parser;
use std::io::Write;
use tessera::kernel::config::TesseraConfig;
use tessera_shell::args::Cli;

fn run(args: &[&str]) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(std::iter::once("tessera").chain(args.iter().copied()))?;
    let map = tessera_shell::build_map(&cli, &TesseraConfig::default())?;
    let mut out = Vec::new();
    tessera_shell::run(&cli, &map, &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn test_lookup_follows_aliases_into_lazy_namespace() {
    let out = run(&["lookup", "varchar", "-n", "mysql"]).unwrap();

    assert!(out.starts_with("Type"));
    assert!(out.contains("String"));
}

#[test]
fn test_lookup_json_output() {
    let out = run(&["--format", "json", "lookup", "set", "-n", "pg", "-n", "mysql"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(value["key"], "enum");
    assert_eq!(value["namespaces"], serde_json::json!(["mysql", "pg"]));
    assert_eq!(value["aliases"], serde_json::json!(["set"]));
}

#[test]
fn test_missing_key_reports_not_found() {
    let err = run(&["lookup", "uuid", "--exclusive", "-n", "mysql"]).unwrap_err();

    assert!(err.to_string().contains("Lookup of `uuid` failed"));
}

#[test]
fn test_fallback_substitutes_missing_key() {
    let out = run(&["lookup", "uuid", "--fallback", "string"]).unwrap();

    assert!(out.contains("String"));
}

#[test]
fn test_list_directives_only() {
    let out = run(&["list", "-t", "directive"]).unwrap();

    assert_eq!(out.lines().count(), 1);
    assert!(out.contains("deprecated"));
}

#[test]
fn test_summary_json_counts_loaded_objects() {
    let out = run(&["--format", "json", "summary"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(value["objects"], 7);
}

#[test]
fn test_bare_manifest_is_loaded_lazily() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(b"[[type]]\nkey = \"uuid\"\nname = \"UUID\"\n").unwrap();
    let manifest = format!("pg={}", file.path().display());

    let summary = run(&["--bare", "-m", &manifest, "summary"]).unwrap();
    assert!(summary.contains("@objects=0"));
    assert!(summary.contains("pg: 1"));

    let out = run(&["--bare", "-m", &manifest, "lookup", "UUID", "-n", "pg"]).unwrap();
    assert!(out.contains("uuid"));
}
