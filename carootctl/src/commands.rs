// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Caroot Authors

//! Implementations of the carootctl subcommands.

use anyhow::{bail, Context, Result};
use caroot::config::{Config, SettingValue};
use caroot::file_ops::{self, CaMaterial};
use caroot::x509::{self, X509Loader};
use log::{error, info};
use std::fs;
use std::path::Path;

/// Prints the resolved settings as JSON on stdout.
pub(crate) fn print(config: &Config) -> Result<()> {
    let json = serde_json::to_string_pretty(&config.settings)?;
    println!("{json}");
    Ok(())
}

/// Validates externally produced CA material and stages it at the
/// resolved locations.
pub(crate) fn import(
    config: &Config,
    cert_bundle: &Path,
    private_key: &Path,
    crl_chain: &Path,
) -> Result<()> {
    let bundle = read(cert_bundle)?;
    let key = read(private_key)?;
    let crl = read(crl_chain)?;

    let loader = X509Loader::load(&bundle, &key, &crl);
    if !loader.is_valid() {
        for err in &loader.errors {
            error!("{err}");
        }
        bail!("Could not validate the CA material, aborting import");
    }

    file_ops::stage_ca_material(
        &config.settings,
        &CaMaterial {
            cert_bundle: bundle,
            private_key: key,
            crl_chain: Some(crl),
        },
    )?;
    info!("Imported CA material into {}", cadir_display(config));
    Ok(())
}

/// Bootstraps a fresh CA: generates a key and a self-signed certificate,
/// then stages them at the resolved locations.
pub(crate) fn setup(config: &Config) -> Result<()> {
    if let Some(cakey) = config.settings.get_str("cakey") {
        if Path::new(cakey).exists() {
            bail!("Existing CA key found at {cakey}, refusing to overwrite");
        }
    }

    let certname = config
        .settings
        .get_str("certname")
        .context("certname did not resolve to a string")?;
    let ttl = config
        .settings
        .get("ca_ttl")
        .and_then(SettingValue::as_seconds)
        .context("ca_ttl did not resolve to a seconds count")?;

    let (cert_pem, key_pem) = x509::generate_ca(certname, ttl)?;
    file_ops::stage_ca_material(
        &config.settings,
        &CaMaterial {
            cert_bundle: cert_pem,
            private_key: key_pem,
            crl_chain: None,
        },
    )?;
    info!(
        "Bootstrapped a new CA for {certname} in {}",
        cadir_display(config)
    );
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))
}

fn cadir_display(config: &Config) -> String {
    config
        .settings
        .get_str("cadir")
        .unwrap_or("the resolved CA directory")
        .to_string()
}
