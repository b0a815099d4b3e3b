// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Caroot Authors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    // The configuration file exists but could not be read. Unlike the
    // accumulated resolution errors this is fatal: nothing downstream can
    // run against settings it never saw.
    #[error("Could not read configuration file {path}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
