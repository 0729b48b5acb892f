/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Helpers a storage manager uses to identify, check, format and mount
//! ext2/ext3/ext4 volumes on block devices.

pub mod command;
pub mod config;
pub mod filesystems;
pub mod fsck;
pub mod mkfs;
pub mod mount;
pub mod path;
pub mod probe;
