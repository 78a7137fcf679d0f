//! Loader configuration file tests.
//!
//! Full-file loading with every section, defaults for omitted sections,
//! unknown section rejection and semantic validation.

use kestrel_common::config::{BoardKind, ConfigError, ConfigLoader, LoaderConfig, LogLevel};
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("loader.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn full_config_loads() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[shared]
log_level = "debug"
service_name = "kestrel-zynq-01"

[launch]
timeout_s = 5
settle_ticks = 250

[board]
kind = "zynq7000"
bootinfo_address = 0x30000

[scripts]
pre-init = """
timeout 5
lsdev
"""
recovery = "help"
"#,
    );

    let config = LoaderConfig::load(&path).unwrap();
    config.validate().unwrap();

    assert_eq!(config.shared.log_level, LogLevel::Debug);
    assert_eq!(config.launch.timeout_s, 5);
    assert_eq!(config.launch.settle_ticks, 250);
    assert_eq!(config.board.kind, BoardKind::Zynq7000);
    assert_eq!(config.board.bootinfo_address, Some(0x30000));

    let pre_init = config.pre_init_script().unwrap();
    let lines: Vec<&str> = pre_init.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines, vec!["timeout 5", "lsdev"]);
    assert_eq!(config.script("recovery"), Some("help"));
}

#[test]
fn omitted_sections_take_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[shared]
service_name = "kestrel"
"#,
    );

    let config = LoaderConfig::load(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.launch.timeout_s, 3);
    assert_eq!(config.launch.settle_ticks, 100);
    assert_eq!(config.board.kind, BoardKind::Sim);
    assert!(config.board.bootinfo_address.is_none());
    assert!(config.scripts.is_empty());
}

#[test]
fn unknown_section_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[shared]
service_name = "kestrel"

[network]
dhcp = true
"#,
    );

    assert!(matches!(
        LoaderConfig::load(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn unknown_board_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[shared]
service_name = "kestrel"

[board]
kind = "stm32h7"
"#,
    );

    assert!(matches!(
        LoaderConfig::load(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn zero_settle_ticks_fails_validation() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[shared]
service_name = "kestrel"

[launch]
settle_ticks = 0
"#,
    );

    let config = LoaderConfig::load(&path).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError(_))
    ));
}
