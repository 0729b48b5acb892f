/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::{
    ffi::CString,
    fs::{self, Permissions},
    io,
    os::unix::fs::PermissionsExt,
    ptr,
};

use log::debug;

use crate::path::{DevicePath, MountPoint};

use super::flags::MountFlags;

pub trait MountInterface {
    fn mount(
        &self,
        device: &DevicePath,
        mountpoint: &MountPoint,
        fs_type: &str,
        flags: MountFlags,
        data: Option<&str>,
    ) -> io::Result<()>;

    fn set_mode(&self, mountpoint: &MountPoint, mode: u32) -> io::Result<()>;
}

/// Calls straight into the kernel.
pub struct LocalMountInterface {}

impl LocalMountInterface {
    pub fn new() -> Self {
        LocalMountInterface {}
    }
}

impl Default for LocalMountInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl MountInterface for LocalMountInterface {
    fn mount(
        &self,
        device: &DevicePath,
        mountpoint: &MountPoint,
        fs_type: &str,
        flags: MountFlags,
        data: Option<&str>,
    ) -> io::Result<()> {
        debug!(
            "mount('{}', '{}', {}, {:?}, {:?})",
            device, mountpoint, fs_type, flags, data
        );
        let src = device.to_cstring()?;
        let tgt = mountpoint.to_cstring()?;
        let fstype = CString::new(fs_type)?;
        let data = data.map(CString::new).transpose()?;
        let data_ptr = data
            .as_ref()
            .map_or(ptr::null(), |d| d.as_ptr() as *const libc::c_void);

        let rc = unsafe {
            libc::mount(
                src.as_ptr(),
                tgt.as_ptr(),
                fstype.as_ptr(),
                flags.bits(),
                data_ptr,
            )
        };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn set_mode(&self, mountpoint: &MountPoint, mode: u32) -> io::Result<()> {
        fs::set_permissions(mountpoint, Permissions::from_mode(mode))
    }
}
