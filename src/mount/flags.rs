/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use bitflags::bitflags;

bitflags! {
    /// Flags passed to `mount(2)`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MountFlags: libc::c_ulong {
        const RDONLY = libc::MS_RDONLY;
        const NOSUID = libc::MS_NOSUID;
        const NODEV = libc::MS_NODEV;
        const NOEXEC = libc::MS_NOEXEC;
        const REMOUNT = libc::MS_REMOUNT;
        const DIRSYNC = libc::MS_DIRSYNC;
        const NOATIME = libc::MS_NOATIME;
        const NODIRATIME = libc::MS_NODIRATIME;
    }
}

/// What the caller asked for, on top of the filesystem's fixed safety flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MountOptions {
    pub read_only: bool,
    pub remount: bool,
    pub executable: bool,
}

impl MountOptions {
    pub fn apply(&self, mut flags: MountFlags) -> MountFlags {
        flags.set(MountFlags::RDONLY, self.read_only);
        flags.set(MountFlags::REMOUNT, self.remount);
        flags
    }
}
