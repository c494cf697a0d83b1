use super::Config;
use crate::bootstrap::{Bootstrap, DEFAULT_INSTALL_HINT};
use crate::error::Error;
use crate::generate::Generator;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let config = Config::default();

    assert_eq!(config.interpreters, ["python3", "python"]);
    assert_eq!(config.runtime_module, "pysh");
    assert_eq!(config.runtime_dir, "pysh");
    assert_eq!(config.runtime_extensions, ["py"]);
    assert_eq!(config.install_hint, DEFAULT_INSTALL_HINT);
    assert_eq!(config.bootstrap().unwrap(), Bootstrap::default());
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let config = Config::parse(
        r#"
interpreters = ["python3.12", "python3"]
runtime_dir = "vendor/pysh"
"#,
    )
    .unwrap();

    assert_eq!(config.interpreters, ["python3.12", "python3"]);
    assert_eq!(config.runtime_dir, "vendor/pysh");
    assert_eq!(config.runtime_module, "pysh");
    assert_eq!(config.runtime_extensions, ["py"]);
}

#[test]
fn test_helpers_follow_settings() {
    let config = Config::parse(
        r#"
interpreters = ["pypy3"]
runtime_module = "shellpy"
runtime_dir = "src/shellpy"
runtime_extensions = ["py", "pyi"]
install_hint = "pip install shellpy"
"#,
    )
    .unwrap();

    let bootstrap = config.bootstrap().unwrap();
    assert_eq!(bootstrap.interpreters(), ["pypy3"]);
    assert_eq!(bootstrap.module(), "shellpy");

    let source = config.runtime_source();
    assert_eq!(source.root, PathBuf::from("src/shellpy"));
    assert_eq!(source.module, "shellpy");
    assert_eq!(source.extensions, ["py", "pyi"]);
}

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pysh.toml");
    fs::write(&path, "runtime_module = \"other\"\n").unwrap();

    assert_eq!(Config::load_from(&path).runtime_module, "other");
}

#[test]
fn test_missing_or_malformed_file_falls_back() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");
    let malformed = dir.path().join("broken.toml");
    fs::write(&malformed, "interpreters = [").unwrap();

    assert_eq!(Config::load_from(&missing), Config::default());
    assert_eq!(Config::load_from(&malformed), Config::default());
}

#[test]
fn test_unsafe_settings_fail_before_generation() {
    let config = Config::parse("interpreters = [\"py\\\"thon\"]\n").unwrap();

    assert!(matches!(
        config.bootstrap(),
        Err(Error::InvalidBootstrap {
            field: "interpreter",
            ..
        })
    ));
    assert!(Generator::from_config(&config).is_err());
}
