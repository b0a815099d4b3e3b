// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Caroot Authors

use crate::permissions::get_euid;
use std::env;
use std::sync::Arc;

pub static DEFAULT_SERVER: &str = "puppet";
pub static DEFAULT_MASTERPORT: &str = "8140";
pub static DEFAULT_CA_TTL: &str = "5y";
pub static DEFAULT_ENVIRONMENT: &str = "production";
pub static SYSTEM_CONFDIR: &str = "/etc/puppetlabs/puppet";
pub static SYSTEM_VARDIR: &str = "/opt/puppetlabs/puppet/cache";

/// Zero-argument capability producing a setting value at resolution time.
pub type ValueHook = Arc<dyn Fn() -> String + Send + Sync>;

/// How a recognized setting obtains its value when the configuration file
/// does not provide one.
#[derive(Clone)]
pub enum DefaultSpec {
    /// A fixed value.
    Literal(&'static str),
    /// A template referencing other settings, resolved by interpolation.
    Interpolated(&'static str),
    /// A value produced by a hook, e.g. the local host identifier.
    Computed(ValueHook),
}

/// The built-in specification of every recognized setting.
///
/// The table is ordered: settings are resolved top to bottom and a
/// reference only sees settings that precede it, so every dependent
/// default lists its dependencies first. The table is built once and never
/// mutated afterwards.
pub(crate) fn default_table(
    host_identifier: &ValueHook,
) -> Vec<(&'static str, DefaultSpec)> {
    use DefaultSpec::*;

    vec![
        ("confdir", Computed(Arc::new(default_confdir))),
        ("ssldir", Interpolated("$confdir/ssl")),
        ("cadir", Interpolated("$ssldir/ca")),
        ("cacert", Interpolated("$cadir/ca_crt.pem")),
        ("cakey", Interpolated("$cadir/ca_key.pem")),
        ("cacrl", Interpolated("$cadir/ca_crl.pem")),
        ("serial", Interpolated("$cadir/serial")),
        ("cert_inventory", Interpolated("$cadir/inventory.txt")),
        ("certname", Computed(host_identifier.clone())),
        ("dns_alt_names", Literal("")),
        ("server", Literal(DEFAULT_SERVER)),
        ("masterport", Literal(DEFAULT_MASTERPORT)),
        ("ca_server", Interpolated("$server")),
        ("ca_port", Interpolated("$masterport")),
        ("server_list", Literal("")),
        ("ca_ttl", Literal(DEFAULT_CA_TTL)),
        ("environment", Literal(DEFAULT_ENVIRONMENT)),
        ("vardir", Computed(Arc::new(default_vardir))),
    ]
}

/// Conventional configuration directory: the system location when running
/// as root, a per-user location otherwise.
pub fn default_confdir() -> String {
    per_user_or_system(SYSTEM_CONFDIR, ".puppetlabs/etc/puppet")
}

/// Conventional cache directory, mirroring the confdir convention.
pub fn default_vardir() -> String {
    per_user_or_system(SYSTEM_VARDIR, ".puppetlabs/opt/puppet/cache")
}

fn per_user_or_system(system: &str, user_suffix: &str) -> String {
    if get_euid() == 0 {
        return system.to_string();
    }
    match env::var("HOME") {
        Ok(home) => format!("{home}/{user_suffix}"),
        Err(_) => system.to_string(),
    }
}
