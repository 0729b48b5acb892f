/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::{
    ffi::{CString, NulError},
    fmt::Display,
    os::unix::ffi::OsStrExt,
    path::Path,
};

/// Prefix for temporary files to use
const TMP_DIR_PREFIX: &str = "extvol";

/// Block device (or image file) holding a filesystem
#[derive(Clone, Debug)]
pub struct DevicePath {
    pub base: Box<Path>,
}

impl DevicePath {
    pub fn new(path: &Path) -> Self {
        Self {
            base: path.to_path_buf().into_boxed_path(),
        }
    }
    /// Create new temporary path with prefix added
    pub fn new_tmp(name: &str) -> Self {
        let base = Path::new("/tmp")
            .join(format!("{}-{}", TMP_DIR_PREFIX, name))
            .into_boxed_path();
        Self { base }
    }
    pub fn to_cstring(&self) -> Result<CString, NulError> {
        CString::new(self.base.as_os_str().as_bytes())
    }
}

impl Display for DevicePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base.display())
    }
}

impl AsRef<Path> for DevicePath {
    fn as_ref(&self) -> &Path {
        self.base.as_ref()
    }
}

/// Directory a device gets mounted on
#[derive(Clone, Debug)]
pub struct MountPoint {
    pub base: Box<Path>,
}

impl MountPoint {
    pub fn new(path: &Path) -> Self {
        Self {
            base: path.to_path_buf().into_boxed_path(),
        }
    }
    pub fn to_cstring(&self) -> Result<CString, NulError> {
        CString::new(self.base.as_os_str().as_bytes())
    }
}

impl Display for MountPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base.display())
    }
}

impl AsRef<Path> for MountPoint {
    fn as_ref(&self) -> &Path {
        self.base.as_ref()
    }
}
