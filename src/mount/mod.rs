/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

pub mod ext3;
pub mod ext4;
pub mod flags;
pub mod syscall;

use std::{fmt::Display, io, path::Path};

use log::{debug, error, info};
use thiserror::Error;

use crate::{
    command::CommandInterface,
    config::Config,
    fsck::{self, CheckError, CheckOutcome},
    mkfs::{self, FormatError},
    path::{DevicePath, MountPoint},
    probe::{self, ProbeError, Superblock},
};

use flags::{MountFlags, MountOptions};
use syscall::MountInterface;

#[derive(Error, Debug)]
pub enum MountError {
    #[error("failed to mount '{device}' at '{mountpoint}': {source}")]
    Syscall {
        device: String,
        mountpoint: String,
        source: io::Error,
    },
    #[error("failed to chmod '{mountpoint}': {source}")]
    Chmod {
        mountpoint: String,
        source: io::Error,
    },
}

impl MountError {
    pub fn errno(&self) -> i32 {
        match self {
            MountError::Syscall { source, .. } | MountError::Chmod { source, .. } => {
                source.raw_os_error().unwrap_or(libc::EIO)
            }
        }
    }
}

/// Result of a successful mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mounted {
    pub fs_type: &'static str,
    /// Flags the successful call used, may include `RDONLY` added by fallback
    pub flags: MountFlags,
}

pub trait ExtFileSystem: Display {
    fn identify(&self, device: &DevicePath) -> Result<Superblock, ProbeError> {
        debug!("identify '{}' as {}", device, self);
        probe::identify(device)
    }

    fn check(
        &self,
        cmdi: &dyn CommandInterface,
        config: &Config,
        device: &DevicePath,
    ) -> Result<CheckOutcome, CheckError> {
        debug!("check '{}' filesystem on '{}'", self, device);
        fsck::run_check(
            cmdi,
            Path::new(&config.tools.e2fsck),
            device,
            config.timeout,
        )
    }

    fn format(
        &self,
        cmdi: &dyn CommandInterface,
        config: &Config,
        device: &DevicePath,
    ) -> Result<(), FormatError> {
        debug!("format '{}' filesystem on '{}'", self, device);
        mkfs::run_format(
            cmdi,
            &self.to_string().to_lowercase(),
            &self.mkfs_cmd(config),
            &self.mkfs_args(config),
            device,
            config.timeout,
        )
    }

    fn mount(
        &self,
        mnti: &dyn MountInterface,
        config: &Config,
        device: &DevicePath,
        mountpoint: &MountPoint,
        opts: MountOptions,
    ) -> Result<Mounted, MountError> {
        debug!(
            "mount '{}' filesystem from '{}' at '{}'",
            self, device, mountpoint
        );
        let mut flags = self.mount_flags(opts);
        let data = self.mount_data(config);

        let mut last_err = None;
        for &fs_type in self.mount_types() {
            let mut rc = mnti.mount(device, mountpoint, fs_type, flags, data.as_deref());
            if let Err(err) = &rc {
                if err.raw_os_error() == Some(libc::EROFS) {
                    error!(
                        "'{}' appears to be a read only filesystem - retrying mount RO",
                        device
                    );
                    flags |= MountFlags::RDONLY;
                    rc = mnti.mount(device, mountpoint, fs_type, flags, data.as_deref());
                }
            }
            match rc {
                Ok(()) => {
                    if let Some(mode) = self.mountpoint_mode(config) {
                        mnti.set_mode(mountpoint, mode).map_err(|source| {
                            error!("failed to chmod '{}' ({})", mountpoint, source);
                            MountError::Chmod {
                                mountpoint: mountpoint.to_string(),
                                source,
                            }
                        })?;
                    }
                    info!("mounted '{}' ({}) at '{}'", device, fs_type, mountpoint);
                    return Ok(Mounted { fs_type, flags });
                }
                Err(err) => {
                    debug!("mount as {} failed: {}", fs_type, err);
                    last_err = Some(err);
                }
            }
        }

        let source = last_err.unwrap_or_else(|| io::Error::from_raw_os_error(libc::ENODEV));
        error!("failed to mount '{}' at '{}' ({})", device, mountpoint, source);
        Err(MountError::Syscall {
            device: device.to_string(),
            mountpoint: mountpoint.to_string(),
            source,
        })
    }

    /// Used in default implementation: format utility.
    /// Example: `"/system/bin/mke2fs"`
    fn mkfs_cmd(&self, config: &Config) -> String;

    /// Used in default implementation: format arguments placed before the device.
    fn mkfs_args(&self, _config: &Config) -> Vec<String> {
        vec![]
    }

    /// Used in default implementation: filesystem types tried in order.
    fn mount_types(&self) -> &'static [&'static str];

    /// Used in default implementation: full flag set for the first attempt.
    fn mount_flags(&self, opts: MountOptions) -> MountFlags;

    /// Used in default implementation: `mount(2)` data argument.
    fn mount_data(&self, _config: &Config) -> Option<String> {
        None
    }

    /// Permissions to set on mountpoint after mounting, if any.
    fn mountpoint_mode(&self, _config: &Config) -> Option<u32> {
        None
    }
}
