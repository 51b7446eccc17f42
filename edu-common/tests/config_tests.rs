//! Configuration resolution tests
//!
//! Tests touching `EDU_ROOT_FOLDER` / `EDU_PORT` are marked `#[serial]` so
//! they never run in parallel with each other.

use edu_common::config::{
    prepare_database_path, resolve_port, resolve_root_folder, TomlConfig, DATABASE_FILE,
    DEFAULT_PORT, PORT_ENV, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_env_root_folder_overrides_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..TomlConfig::default()
    };

    let resolved = resolve_root_folder(None, &config);
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/from/env"));
}

#[test]
#[serial]
fn test_cli_root_folder_overrides_env() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");

    let resolved = resolve_root_folder(Some(Path::new("/from/cli")), &TomlConfig::default());
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/from/cli"));
}

#[test]
#[serial]
fn test_toml_root_folder_used_without_env() {
    env::remove_var(ROOT_FOLDER_ENV);
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..TomlConfig::default()
    };

    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/from/toml"));
}

#[test]
#[serial]
fn test_default_root_folder_is_not_empty() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolved = resolve_root_folder(None, &TomlConfig::default());
    assert!(!resolved.as_os_str().is_empty());
}

#[test]
#[serial]
fn test_port_priority() {
    env::remove_var(PORT_ENV);
    let config = TomlConfig {
        port: 6100,
        ..TomlConfig::default()
    };
    assert_eq!(resolve_port(None, &config).unwrap(), 6100);
    assert_eq!(resolve_port(None, &TomlConfig::default()).unwrap(), DEFAULT_PORT);

    env::set_var(PORT_ENV, "6200");
    assert_eq!(resolve_port(None, &config).unwrap(), 6200);
    assert_eq!(resolve_port(Some(6300), &config).unwrap(), 6300);

    env::set_var(PORT_ENV, "not-a-port");
    let result = resolve_port(None, &config);
    env::remove_var(PORT_ENV);
    assert!(result.is_err());
}

#[test]
fn test_load_reads_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        root_folder = "/srv/edu"
        port = 7000

        [enrollment]
        require_open_registration = false
        "#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/edu")));
    assert_eq!(config.port, 7000);
    assert!(!config.enrollment.require_open_registration);
    assert!(config.enrollment.require_active_student);
}

#[test]
fn test_load_missing_file_is_error() {
    let dir = TempDir::new().unwrap();
    assert!(TomlConfig::load(&dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_prepare_database_path_creates_folder() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("a").join("b");

    let db_path = prepare_database_path(&root).unwrap();

    assert!(root.is_dir());
    assert_eq!(db_path, root.join(DATABASE_FILE));
}
