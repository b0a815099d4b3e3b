// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Caroot Authors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("File staging error: {0}")]
    FileOps(#[from] crate::file_ops::FileOpsError),
    #[error("Host identity error: {0}")]
    Host(#[from] crate::host::HostError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),
    #[error("Permission error: {0}")]
    Permission(#[from] crate::permissions::PermissionError),
    #[error("Certificate handling error: {0}")]
    X509(#[from] crate::x509::X509Error),
}

pub type Result<T> = std::result::Result<T, Error>;
