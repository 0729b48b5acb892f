/* Any copyright is dedicated to the Public Domain.
 * https://creativecommons.org/publicdomain/zero/1.0/ */

use crate::mount::{ext3::Ext3, ext4::Ext4, ExtFileSystem};

pub const FILESYSTEMS: &[&dyn ExtFileSystem] = &[
    &Ext3::new(),
    &Ext4::new(),
    // your filesystem here
];

pub fn filesystems_available() -> Vec<String> {
    FILESYSTEMS
        .iter()
        .map(|fs| fs.to_string().to_lowercase())
        .collect()
}

pub fn filesystem_by_name(name: &str) -> Option<&'static dyn ExtFileSystem> {
    let name = name.to_lowercase();
    FILESYSTEMS
        .iter()
        .find(|fs| fs.to_string().to_lowercase() == name)
        .copied()
}
