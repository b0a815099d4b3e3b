// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Caroot Authors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Could not read the local hostname")]
    Gethostname(#[source] std::io::Error),

    #[error("Hostname is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Lowercased hostname of the local machine.
///
/// Used as the default certname and as the host part of the synthesized
/// subject alternative name entry.
pub fn local_identifier() -> Result<String, HostError> {
    let mut buf = [0u8; 256];
    let ret = unsafe {
        libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len())
    };
    if ret != 0 {
        return Err(HostError::Gethostname(std::io::Error::last_os_error()));
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let name = std::str::from_utf8(&buf[..len])?;
    Ok(name.to_ascii_lowercase())
}
