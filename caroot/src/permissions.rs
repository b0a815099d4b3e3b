// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Caroot Authors

use libc::{gid_t, uid_t};
use std::{
    ffi::CString,
    fs, io,
    os::unix::{ffi::OsStrExt, fs::PermissionsExt},
    path::Path,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PermissionError {
    /// Failed to change file ownership
    #[error("Could not change owner of {0}")]
    ChOwn(String),

    /// Failed to convert a name to CString
    #[error("Could not convert {0} to CString")]
    CStringConversion(String),

    /// Error getting GID from group name
    #[error("Could not get GID from group name {group}: {error:?}")]
    GetGrNam {
        group: String,
        #[source]
        error: io::Error,
    },

    /// Error getting UID from user name
    #[error("Could not get UID from user name {user}: {error:?}")]
    GetPWNam {
        user: String,
        #[source]
        error: io::Error,
    },

    /// Invalid parameter error
    #[error(
        "Invalid parameter format: {value} cannot be parsed as 'user:group'"
    )]
    InvalidInput { value: String },

    /// Null string provided
    #[error("Null string")]
    NullString(#[from] std::ffi::NulError),

    /// Error setting mode for file
    #[error("Could not set permissions of {path} to mode {mode:#o}")]
    SetMode {
        path: String,
        mode: u32,
        #[source]
        source: io::Error,
    },
}

pub fn get_euid() -> uid_t {
    unsafe { libc::geteuid() }
}

/// Numeric ids of the service account that owns staged CA material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceIds {
    pub uid: uid_t,
    pub gid: gid_t,
}

impl TryFrom<&str> for ServiceIds {
    type Error = PermissionError;

    fn try_from(value: &str) -> Result<Self, PermissionError> {
        let parts = value.split(':').collect::<Vec<&str>>();

        if parts.len() != 2 {
            return Err(PermissionError::InvalidInput {
                value: value.to_string(),
            });
        }

        let user = parts[0];
        let group = parts[1];

        // Get gid from group name
        let gid = if let Ok(g_cstr) = CString::new(group.as_bytes()) {
            let p = unsafe { libc::getgrnam(g_cstr.as_ptr()) };
            if p.is_null() {
                return Err(PermissionError::GetGrNam {
                    group: group.to_string(),
                    error: io::Error::last_os_error(),
                });
            }
            unsafe { (*p).gr_gid }
        } else {
            return Err(PermissionError::CStringConversion(
                group.to_string(),
            ));
        };

        // Get uid from user name
        let uid = if let Ok(u_cstr) = CString::new(user.as_bytes()) {
            let p = unsafe { libc::getpwnam(u_cstr.as_ptr()) };
            if p.is_null() {
                return Err(PermissionError::GetPWNam {
                    user: user.to_string(),
                    error: io::Error::last_os_error(),
                });
            }
            unsafe { (*p).pw_uid }
        } else {
            return Err(PermissionError::CStringConversion(user.to_string()));
        };

        Ok(ServiceIds { uid, gid })
    }
}

/// Hands ownership of `path` to the given service account.
pub fn chown(path: &Path, ids: ServiceIds) -> Result<(), PermissionError> {
    let c_path = CString::new(path.as_os_str().as_bytes())?;
    if unsafe { libc::chown(c_path.as_ptr(), ids.uid, ids.gid) } != 0 {
        return Err(PermissionError::ChOwn(path.display().to_string()));
    }
    Ok(())
}

/// Sets the permission bits of `path`.
pub fn set_mode(path: &Path, mode: u32) -> Result<(), PermissionError> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(
        |source| PermissionError::SetMode {
            path: path.display().to_string(),
            mode,
            source,
        },
    )
}
