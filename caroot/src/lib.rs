// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Caroot Authors

pub mod config;
pub mod error;
pub mod file_ops;
pub mod host;
pub mod permissions;
pub mod x509;

pub use error::{Error, Result};
