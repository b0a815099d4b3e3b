// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Caroot Authors

use crate::config::{
    default_confdir, parse, ConfigError, Section, Settings, SettingsResolver,
};
use log::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Conventional location of the configuration file, next to the
/// conventional confdir.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(format!("{}/puppet.conf", default_confdir()))
}

/// A loaded configuration: the resolved settings plus the resolution
/// error log.
///
/// `errors` is never raised; callers decide whether a non-empty log is
/// fatal for their workflow. The settings mapping is always populated,
/// with unresolved values carried as their literal text.
#[derive(Debug)]
pub struct Config {
    pub path: PathBuf,
    pub settings: Settings,
    pub errors: Vec<String>,
}

impl Config {
    /// Loads the configuration from `path`, or from the conventional
    /// location if no path is given. A missing file is not an error (the
    /// defaults apply); an unreadable file is.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_resolver(path, &SettingsResolver::new())
    }

    pub fn load_with_resolver(
        path: Option<&Path>,
        resolver: &SettingsResolver,
    ) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };

        let overrides = match fs::read_to_string(&path) {
            Ok(text) => {
                debug!("Loading configuration from {}", path.display());
                parse(&text).main()
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(
                    "Configuration file {} not found, using defaults",
                    path.display()
                );
                Section::new()
            }
            Err(e) => {
                return Err(ConfigError::Unreadable {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };

        let (settings, errors) = resolver.resolve(&overrides);
        Ok(Config {
            path,
            settings,
            errors,
        })
    }
}
