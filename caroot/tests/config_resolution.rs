// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Caroot Authors

//! End-to-end configuration loading: file on disk through parsing,
//! resolution and transforms.

use caroot::config::{Config, SettingValue, SettingsResolver, ValueHook};
use std::io::Write;
use std::sync::Arc;

fn resolver() -> SettingsResolver {
    let hook: ValueHook = Arc::new(|| "chihuahua-333".to_string());
    SettingsResolver::with_host_identifier(hook)
}

fn load(contents: &str) -> Config {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let path = dir.path().join("puppet.conf");
    let mut file =
        std::fs::File::create(&path).expect("failed to create config file");
    file.write_all(contents.as_bytes())
        .expect("failed to write config file");
    Config::load_with_resolver(Some(path.as_path()), &resolver())
        .expect("failed to load config")
}

#[test]
fn test_full_config_file_resolves() {
    let config = load(
        "# CA host configuration\n\
         certname = ca01.example.com\n\
         dns_alt_names = foo.com,IP:123.456.789\n\
         \n\
         [main]\n\
         ssldir = /etc/puppet/ssl {owner = service, mode = 750}\n\
         ca_ttl = 5y\n\
         \n\
         [master]\n\
         ssldir = /this/must/not/leak/into/main\n",
    );

    assert!(config.errors.is_empty(), "errors: {:?}", config.errors);
    let settings = &config.settings;
    assert_eq!(settings.get_str("certname"), Some("ca01.example.com"));
    assert_eq!(settings.get_str("ssldir"), Some("/etc/puppet/ssl"));
    assert_eq!(settings.get_str("cadir"), Some("/etc/puppet/ssl/ca"));
    assert_eq!(
        settings.get_str("cacert"),
        Some("/etc/puppet/ssl/ca/ca_crt.pem")
    );
    assert_eq!(
        settings.get_str("cakey"),
        Some("/etc/puppet/ssl/ca/ca_key.pem")
    );
    assert_eq!(
        settings.get("ca_ttl").and_then(SettingValue::as_seconds),
        Some(157_680_000)
    );
    assert_eq!(
        settings.get_str("subject_alt_names"),
        Some("DNS:chihuahua-333, DNS:foo.com, IP:123.456.789")
    );
}

#[test]
fn test_unresolved_references_survive_loading() {
    let config = load("ssldir = $vardir/ssl\n");
    assert_eq!(config.errors.len(), 1);
    assert!(config.errors[0].contains("$vardir"));
    assert!(config.errors[0].contains("$vardir/ssl"));
    assert_eq!(
        config.settings.get_str("cacert"),
        Some("$vardir/ssl/ca/ca_crt.pem")
    );
}

#[test]
fn test_server_list_drives_ca_addresses() {
    let config = load("server_list = ca.example.com:8080,fallback\n");
    assert!(config.errors.is_empty());
    let settings = &config.settings;
    assert_eq!(settings.get_str("server"), Some("ca.example.com"));
    assert_eq!(settings.get_str("ca_server"), Some("ca.example.com"));
    assert_eq!(settings.get_str("ca_port"), Some("8080"));
    assert_eq!(settings.get_str("masterport"), Some("8080"));
    let servers = settings
        .get("server_list")
        .and_then(SettingValue::as_servers)
        .expect("server_list should resolve to a list");
    assert_eq!(servers.len(), 2);
    assert_eq!(servers[1].host, "fallback");
    assert_eq!(servers[1].port, None);
}

#[test]
fn test_settings_serialize_to_json() {
    let config = load("server_list = a:1\nca_ttl = 60\n");
    let json = serde_json::to_value(&config.settings)
        .expect("settings should serialize");
    assert_eq!(json["ca_ttl"], 60);
    assert_eq!(json["server"], "a");
    assert_eq!(json["server_list"][0]["host"], "a");
    assert_eq!(json["server_list"][0]["port"], "1");
    assert_eq!(json["environment"], "production");
}

#[test]
fn test_unreadable_config_converts_to_the_crate_error() {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    // A directory cannot be read as a file, which is a hard stop.
    let result = Config::load_with_resolver(Some(dir.path()), &resolver());
    let err: caroot::Error = result.expect_err("expected an error").into();
    assert!(matches!(err, caroot::Error::Config(_)));
}

#[test]
fn test_loading_twice_is_identical() {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let path = dir.path().join("puppet.conf");
    std::fs::write(&path, "ssldir = $vardir/ssl\nca_ttl = bogus\n")
        .expect("failed to write config file");

    let resolver = resolver();
    let first = Config::load_with_resolver(Some(path.as_path()), &resolver)
        .expect("failed to load config");
    let second = Config::load_with_resolver(Some(path.as_path()), &resolver)
        .expect("failed to load config");
    assert_eq!(first.settings, second.settings);
    assert_eq!(first.errors, second.errors);
}
