/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt::Display;

use crate::config::Config;

use super::{
    flags::{MountFlags, MountOptions},
    ExtFileSystem,
};

/// ext3 volumes, also accepts plain ext2
pub struct Ext3;

impl Display for Ext3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ext3")
    }
}

impl ExtFileSystem for Ext3 {
    fn mkfs_cmd(&self, config: &Config) -> String {
        config.tools.mke2fs.clone()
    }
    fn mkfs_args(&self, config: &Config) -> Vec<String> {
        vec![
            "-b".to_owned(),
            config.ext3.block_size.to_string(),
            "-m".to_owned(),
            config.ext3.reserved_percent.to_string(),
            "-L".to_owned(),
            config.ext3.label.clone(),
            "-v".to_owned(),
        ]
    }
    fn mount_types(&self) -> &'static [&'static str] {
        &["ext3", "ext2"]
    }
    fn mount_flags(&self, opts: MountOptions) -> MountFlags {
        // never executable
        opts.apply(
            MountFlags::NODEV
                | MountFlags::NOEXEC
                | MountFlags::NOSUID
                | MountFlags::NOATIME
                | MountFlags::NODIRATIME,
        )
    }
    fn mount_data(&self, _config: &Config) -> Option<String> {
        Some("user_xattr".to_owned())
    }
    fn mountpoint_mode(&self, config: &Config) -> Option<u32> {
        Some(config.ext3.mountpoint_mode)
    }
}

impl Ext3 {
    pub const fn new() -> Self {
        Self {}
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        command::tests::FakeCommandInterface,
        mount::tests::{device, mountpoint, FakeMountInterface},
        mount::MountError,
    };

    use super::*;

    const BASE: MountFlags = MountFlags::NODEV
        .union(MountFlags::NOEXEC)
        .union(MountFlags::NOSUID)
        .union(MountFlags::NOATIME)
        .union(MountFlags::NODIRATIME);

    #[test]
    fn test_flags() {
        let fs = Ext3::new();
        assert_eq!(BASE, fs.mount_flags(MountOptions::default()));
        let opts = MountOptions {
            read_only: true,
            remount: true,
            executable: true,
        };
        assert_eq!(
            BASE | MountFlags::RDONLY | MountFlags::REMOUNT,
            fs.mount_flags(opts)
        );
    }

    #[test]
    fn test_format_arguments() {
        let cmdi = FakeCommandInterface::new(vec![Ok(0)]);
        Ext3::new()
            .format(&cmdi, &Config::default(), &device())
            .unwrap();
        assert_eq!(
            vec![
                "/system/bin/mke2fs",
                "-b",
                "4096",
                "-m",
                "1",
                "-L",
                "android",
                "-v",
                "/dev/block/vold/179:1"
            ],
            cmdi.last()
        );
    }

    #[test]
    fn test_mount_first_type() {
        let mnti = FakeMountInterface::new(vec![0]);
        let mounted = Ext3::new()
            .mount(
                &mnti,
                &Config::default(),
                &device(),
                &mountpoint(),
                MountOptions::default(),
            )
            .unwrap();
        assert_eq!("ext3", mounted.fs_type);
        assert_eq!(BASE, mounted.flags);
        let calls = mnti.calls.borrow();
        assert_eq!(1, calls.len());
        assert_eq!(Some("user_xattr".to_owned()), calls[0].data);
        assert_eq!(vec![0o777], *mnti.modes.borrow());
    }

    #[test]
    fn test_mount_falls_back_to_ext2() {
        let mnti = FakeMountInterface::new(vec![libc::EINVAL, 0]);
        let mounted = Ext3::new()
            .mount(
                &mnti,
                &Config::default(),
                &device(),
                &mountpoint(),
                MountOptions::default(),
            )
            .unwrap();
        assert_eq!("ext2", mounted.fs_type);
        let types: Vec<String> = mnti.calls.borrow().iter().map(|c| c.fs_type.clone()).collect();
        assert_eq!(vec!["ext3", "ext2"], types);
    }

    #[test]
    fn test_read_only_retry_sticks_for_next_type() {
        let mnti = FakeMountInterface::new(vec![libc::EROFS, libc::EINVAL, 0]);
        let mounted = Ext3::new()
            .mount(
                &mnti,
                &Config::default(),
                &device(),
                &mountpoint(),
                MountOptions::default(),
            )
            .unwrap();
        assert_eq!("ext2", mounted.fs_type);
        assert_eq!(BASE | MountFlags::RDONLY, mounted.flags);
        let calls = mnti.calls.borrow();
        assert_eq!(3, calls.len());
        assert_eq!(BASE, calls[0].flags);
        assert_eq!(BASE | MountFlags::RDONLY, calls[1].flags);
        assert_eq!(BASE | MountFlags::RDONLY, calls[2].flags);
    }

    #[test]
    fn test_mount_all_types_fail() {
        let mnti = FakeMountInterface::new(vec![libc::EINVAL, libc::EBUSY]);
        let err = Ext3::new()
            .mount(
                &mnti,
                &Config::default(),
                &device(),
                &mountpoint(),
                MountOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, MountError::Syscall { .. }));
        assert_eq!(libc::EBUSY, err.errno());
        assert!(mnti.modes.borrow().is_empty());
    }

    #[test]
    fn test_chmod_failure() {
        let mut mnti = FakeMountInterface::new(vec![0]);
        mnti.chmod_errno = Some(libc::EPERM);
        let err = Ext3::new()
            .mount(
                &mnti,
                &Config::default(),
                &device(),
                &mountpoint(),
                MountOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, MountError::Chmod { .. }));
        assert_eq!(libc::EPERM, err.errno());
    }
}
