// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Caroot Authors

use crate::config::Settings;
use crate::permissions::{chown, get_euid, set_mode, PermissionError, ServiceIds};
use log::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub static DIR_MODE: u32 = 0o750;
pub static FILE_MODE: u32 = 0o640;
pub static SERIAL_INIT: &str = "0x0001\n";

/// Service account that owns staged CA material when the tool runs as
/// root.
pub static DEFAULT_RUN_AS: &str = "puppet:puppet";

#[derive(Error, Debug)]
pub enum FileOpsError {
    #[error("Could not create directory {path}")]
    CreateDir {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Setting {0} did not resolve to a path")]
    MissingPath(String),

    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),

    #[error("Could not write {path}")]
    WriteFile {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// CA material destined for the resolved filesystem layout.
#[derive(Debug, Clone)]
pub struct CaMaterial {
    pub cert_bundle: String,
    pub private_key: String,
    pub crl_chain: Option<String>,
}

/// Writes CA material to the locations the settings resolved to:
/// the CA directory (0750), then certificate, key, CRL, serial and
/// inventory files (0640). When running as root, ownership of everything
/// written is handed to the service account.
pub fn stage_ca_material(
    settings: &Settings,
    material: &CaMaterial,
) -> Result<(), FileOpsError> {
    let cadir = settings_path(settings, "cadir")?;
    let cacert = settings_path(settings, "cacert")?;
    let cakey = settings_path(settings, "cakey")?;
    let cacrl = settings_path(settings, "cacrl")?;
    let serial = settings_path(settings, "serial")?;
    let inventory = settings_path(settings, "cert_inventory")?;

    let mut written = vec![ensure_dir(&cadir)?];

    written.push(write_file(&cacert, &material.cert_bundle)?);
    written.push(write_file(&cakey, &material.private_key)?);
    match &material.crl_chain {
        Some(crl) => written.push(write_file(&cacrl, crl)?),
        None => info!("No CRL chain to stage, skipping {}", cacrl.display()),
    }
    written.push(write_file(&serial, SERIAL_INIT)?);
    written.push(write_file(&inventory, "")?);

    if get_euid() == 0 {
        match ServiceIds::try_from(DEFAULT_RUN_AS) {
            Ok(ids) => {
                for path in &written {
                    chown(path, ids)?;
                }
            }
            Err(e) => warn!(
                "Service account {DEFAULT_RUN_AS} not available, staged \
                 files stay owned by the current user: {e}"
            ),
        }
    } else {
        debug!("Not running as root, staged files keep current ownership");
    }

    Ok(())
}

fn settings_path(
    settings: &Settings,
    name: &str,
) -> Result<PathBuf, FileOpsError> {
    match settings.get_str(name) {
        Some(value) if !value.is_empty() => Ok(PathBuf::from(value)),
        _ => Err(FileOpsError::MissingPath(name.to_string())),
    }
}

fn ensure_dir(path: &Path) -> Result<PathBuf, FileOpsError> {
    fs::create_dir_all(path).map_err(|source| FileOpsError::CreateDir {
        path: path.display().to_string(),
        source,
    })?;
    set_mode(path, DIR_MODE)?;
    Ok(path.to_path_buf())
}

fn write_file(path: &Path, contents: &str) -> Result<PathBuf, FileOpsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| {
            FileOpsError::CreateDir {
                path: parent.display().to_string(),
                source,
            }
        })?;
    }
    fs::write(path, contents).map_err(|source| FileOpsError::WriteFile {
        path: path.display().to_string(),
        source,
    })?;
    set_mode(path, FILE_MODE)?;
    debug!("Wrote {}", path.display());
    Ok(path.to_path_buf())
}
