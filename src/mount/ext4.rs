/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt::Display;

use crate::config::Config;

use super::{
    flags::{MountFlags, MountOptions},
    ExtFileSystem,
};

pub struct Ext4;

impl Display for Ext4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ext4")
    }
}

impl ExtFileSystem for Ext4 {
    fn mkfs_cmd(&self, config: &Config) -> String {
        config.tools.make_ext4fs.clone()
    }
    fn mkfs_args(&self, config: &Config) -> Vec<String> {
        if config.ext4.no_journal {
            vec!["-J".to_owned()]
        } else {
            vec![]
        }
    }
    fn mount_types(&self) -> &'static [&'static str] {
        &["ext4"]
    }
    fn mount_flags(&self, opts: MountOptions) -> MountFlags {
        let mut flags =
            MountFlags::NOATIME | MountFlags::NODEV | MountFlags::NOSUID | MountFlags::DIRSYNC;
        flags.set(MountFlags::NOEXEC, !opts.executable);
        opts.apply(flags)
    }
    fn mount_data(&self, config: &Config) -> Option<String> {
        config.ext4.user_xattr.then(|| "user_xattr".to_owned())
    }
}

impl Ext4 {
    pub const fn new() -> Self {
        Self {}
    }
}
