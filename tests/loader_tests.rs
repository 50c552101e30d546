//! Loader round trips through real files.

use std::io::Write;

use tempfile::TempDir;

use confdiff::prelude::*;
use confdiff::{driver, loader};

#[test]
fn test_read_config_file_and_parse() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("running.conf");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "interface Vlan2").unwrap();
    writeln!(file, "  shutdown").unwrap();

    let text = loader::read_config_file(&path).unwrap();
    let config = ConfigTree::parse(driver::for_platform(Platform::CiscoIos), &text).unwrap();
    assert_eq!(config.lines(), vec!["interface Vlan2", "  shutdown"]);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = loader::read_config_file(dir.path().join("absent.conf")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_tag_rules_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tags.yml");
    std::fs::write(
        &path,
        "- lineage:\n    - startswith: [ntp, 'no ntp']\n  add_tags: ntp\n",
    )
    .unwrap();

    let rules = loader::load_tag_rules_from_file(&path).unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].lineage.len(), 1);
    assert!(rules[0].apply_tags.contains("ntp"));
}

#[test]
fn test_malformed_tag_rules_are_yaml_errors() {
    assert!(matches!(
        loader::load_tag_rules("- lineage: 17\n"),
        Err(Error::Yaml(_))
    ));
}

#[test]
fn test_v2_options_file_drives_remediation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("options.yml");
    std::fs::write(
        &path,
        concat!(
            "style: generic\n",
            "idempotent_commands:\n",
            "- lineage:\n",
            "  - startswith: snmp-server location\n",
            "negation_negate_with:\n",
            "- lineage:\n",
            "  - startswith: logging buffered\n",
            "  use: no logging buffered\n",
        ),
    )
    .unwrap();

    let custom = loader::load_v2_options_from_file(&path, Platform::Generic).unwrap();
    let running = ConfigTree::parse(
        custom.clone(),
        "snmp-server location old closet\nlogging buffered 128000\n",
    )
    .unwrap();
    let generated =
        ConfigTree::parse(custom, "snmp-server location new closet\n").unwrap();

    let lines = running.config_to_get_to(&generated).unwrap().lines();
    assert_eq!(
        lines,
        vec!["no logging buffered", "snmp-server location new closet"]
    );
}
