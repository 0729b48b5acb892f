/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::{
    fmt::{Display, Write},
    fs::File,
    io::{self, Read, Seek, SeekFrom},
};

use log::{debug, error};
use serde::Serialize;
use thiserror::Error;

use crate::path::DevicePath;

/// Superblock always starts 1024 bytes into the device
pub const SUPERBLOCK_OFFSET: u64 = 1024;
pub const SUPERBLOCK_READ_SIZE: usize = 512;

/// Shared by ext2, ext3 and ext4
pub const EXT_SUPER_MAGIC: u16 = 0xEF53;

const S_BLOCKS_COUNT_LO: usize = 0x04;
const S_LOG_BLOCK_SIZE: usize = 0x18;
const S_MAGIC: usize = 0x38;
const S_FEATURE_COMPAT: usize = 0x5C;
const S_FEATURE_INCOMPAT: usize = 0x60;
const S_FEATURE_RO_COMPAT: usize = 0x64;
const S_UUID: usize = 0x68;
const S_VOLUME_NAME: usize = 0x78;
const S_BLOCKS_COUNT_HI: usize = 0x150;

const COMPAT_HAS_JOURNAL: u32 = 0x0004;
const INCOMPAT_EXTENTS: u32 = 0x0040;
const INCOMPAT_64BIT: u32 = 0x0080;
const INCOMPAT_FLEX_BG: u32 = 0x0200;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("unable to open device '{path}': {source}")]
    Open { path: String, source: io::Error },
    #[error("unable to seek to superblock: {0}")]
    Seek(io::Error),
    #[error("unable to read superblock: {0}")]
    Read(io::Error),
    #[error("not an ext filesystem (magic {0:#06x})")]
    BadMagic(u16),
}

impl ProbeError {
    pub fn errno(&self) -> i32 {
        match self {
            ProbeError::Open { source, .. } => source.raw_os_error().unwrap_or(libc::EIO),
            ProbeError::Seek(err) | ProbeError::Read(err) => {
                err.raw_os_error().unwrap_or(libc::EIO)
            }
            ProbeError::BadMagic(_) => libc::ENODATA,
        }
    }
}

/// Revision guessed from the feature words; informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtKind {
    Ext2,
    Ext3,
    Ext4,
}

impl Display for ExtKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtKind::Ext2 => write!(f, "ext2"),
            ExtKind::Ext3 => write!(f, "ext3"),
            ExtKind::Ext4 => write!(f, "ext4"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Superblock {
    pub kind: ExtKind,
    pub blocks_count: u64,
    pub block_size: u64,
    pub feature_compat: u32,
    pub feature_incompat: u32,
    pub feature_ro_compat: u32,
    pub uuid: String,
    pub label: String,
}

impl Superblock {
    pub fn parse(buf: &[u8; SUPERBLOCK_READ_SIZE]) -> Result<Self, ProbeError> {
        let magic = read_u16(buf, S_MAGIC);
        if magic != EXT_SUPER_MAGIC {
            return Err(ProbeError::BadMagic(magic));
        }

        let feature_compat = read_u32(buf, S_FEATURE_COMPAT);
        let feature_incompat = read_u32(buf, S_FEATURE_INCOMPAT);
        let feature_ro_compat = read_u32(buf, S_FEATURE_RO_COMPAT);

        let kind = if feature_incompat & (INCOMPAT_EXTENTS | INCOMPAT_64BIT | INCOMPAT_FLEX_BG)
            != 0
        {
            ExtKind::Ext4
        } else if feature_compat & COMPAT_HAS_JOURNAL != 0 {
            ExtKind::Ext3
        } else {
            ExtKind::Ext2
        };

        let mut blocks_count = read_u32(buf, S_BLOCKS_COUNT_LO) as u64;
        if feature_incompat & INCOMPAT_64BIT != 0 {
            blocks_count |= (read_u32(buf, S_BLOCKS_COUNT_HI) as u64) << 32;
        }
        // s_log_block_size is tiny on any sane filesystem, clamp to avoid overflow
        let block_size = 1024u64 << read_u32(buf, S_LOG_BLOCK_SIZE).min(16);

        Ok(Self {
            kind,
            blocks_count,
            block_size,
            feature_compat,
            feature_incompat,
            feature_ro_compat,
            uuid: format_uuid(&buf[S_UUID..S_UUID + 16]),
            label: parse_label(&buf[S_VOLUME_NAME..S_VOLUME_NAME + 16]),
        })
    }
}

/// Check that `device` holds an ext2/3/4 filesystem by looking at the superblock magic.
pub fn identify(device: &DevicePath) -> Result<Superblock, ProbeError> {
    let mut file = File::open(device).map_err(|source| {
        error!("unable to open device '{}' ({})", device, source);
        ProbeError::Open {
            path: device.to_string(),
            source,
        }
    })?;

    file.seek(SeekFrom::Start(SUPERBLOCK_OFFSET)).map_err(|err| {
        error!("unable to lseek to get superblock ({})", err);
        ProbeError::Seek(err)
    })?;

    let mut buf = [0u8; SUPERBLOCK_READ_SIZE];
    file.read_exact(&mut buf).map_err(|err| {
        error!("unable to read superblock ({})", err);
        ProbeError::Read(err)
    })?;

    let sb = Superblock::parse(&buf)?;
    debug!("'{}' looks like {} ({} blocks)", device, sb.kind, sb.blocks_count);
    Ok(sb)
}

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

fn format_uuid(bytes: &[u8]) -> String {
    let mut uuid = String::with_capacity(36);
    for (i, b) in bytes.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            uuid.push('-');
        }
        let _ = write!(uuid, "{:02x}", b);
    }
    uuid
}

fn parse_label(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn superblock(compat: u32, incompat: u32) -> [u8; SUPERBLOCK_READ_SIZE] {
        let mut sb = [0u8; SUPERBLOCK_READ_SIZE];
        sb[S_MAGIC..S_MAGIC + 2].copy_from_slice(&EXT_SUPER_MAGIC.to_le_bytes());
        sb[S_BLOCKS_COUNT_LO..S_BLOCKS_COUNT_LO + 4].copy_from_slice(&1000u32.to_le_bytes());
        sb[S_LOG_BLOCK_SIZE..S_LOG_BLOCK_SIZE + 4].copy_from_slice(&2u32.to_le_bytes());
        sb[S_FEATURE_COMPAT..S_FEATURE_COMPAT + 4].copy_from_slice(&compat.to_le_bytes());
        sb[S_FEATURE_INCOMPAT..S_FEATURE_INCOMPAT + 4].copy_from_slice(&incompat.to_le_bytes());
        sb
    }

    fn write_image(name: &str, sb: &[u8]) -> DevicePath {
        let device = DevicePath::new_tmp(name);
        let mut image = vec![0u8; SUPERBLOCK_OFFSET as usize];
        image.extend_from_slice(sb);
        fs::write(&device, image).unwrap();
        device
    }

    #[test]
    fn test_parse_ext2() {
        let sb = Superblock::parse(&superblock(0, 0)).unwrap();
        assert_eq!(ExtKind::Ext2, sb.kind);
        assert_eq!(1000, sb.blocks_count);
        assert_eq!(4096, sb.block_size);
    }

    #[test]
    fn test_parse_journal_is_ext3() {
        let sb = Superblock::parse(&superblock(COMPAT_HAS_JOURNAL, 0)).unwrap();
        assert_eq!(ExtKind::Ext3, sb.kind);
    }

    #[test]
    fn test_parse_extents_is_ext4() {
        let sb = Superblock::parse(&superblock(COMPAT_HAS_JOURNAL, INCOMPAT_EXTENTS)).unwrap();
        assert_eq!(ExtKind::Ext4, sb.kind);
    }

    #[test]
    fn test_parse_64bit_blocks_count() {
        let mut raw = superblock(0, INCOMPAT_64BIT);
        raw[S_BLOCKS_COUNT_HI..S_BLOCKS_COUNT_HI + 4].copy_from_slice(&1u32.to_le_bytes());
        let sb = Superblock::parse(&raw).unwrap();
        assert_eq!((1u64 << 32) + 1000, sb.blocks_count);
    }

    #[test]
    fn test_parse_label_and_uuid() {
        let mut raw = superblock(0, 0);
        raw[S_VOLUME_NAME..S_VOLUME_NAME + 7].copy_from_slice(b"android");
        for (i, b) in raw[S_UUID..S_UUID + 16].iter_mut().enumerate() {
            *b = i as u8;
        }
        let sb = Superblock::parse(&raw).unwrap();
        assert_eq!("android", sb.label);
        assert_eq!("00010203-0405-0607-0809-0a0b0c0d0e0f", sb.uuid);
    }

    #[test]
    fn test_parse_bad_magic() {
        let mut raw = superblock(0, 0);
        raw[S_MAGIC] = 0x34;
        raw[S_MAGIC + 1] = 0x12;
        let err = Superblock::parse(&raw).unwrap_err();
        assert!(matches!(err, ProbeError::BadMagic(0x1234)));
        assert_eq!(libc::ENODATA, err.errno());
    }

    #[test]
    fn test_identify_image() {
        let device = write_image("probe-ok.img", &superblock(COMPAT_HAS_JOURNAL, 0));
        let sb = identify(&device).unwrap();
        assert_eq!(ExtKind::Ext3, sb.kind);
        fs::remove_file(&device).unwrap();
    }

    #[test]
    fn test_identify_zeroed_image() {
        let device = write_image("probe-zero.img", &[0u8; SUPERBLOCK_READ_SIZE]);
        let err = identify(&device).unwrap_err();
        assert_eq!(libc::ENODATA, err.errno());
        fs::remove_file(&device).unwrap();
    }

    #[test]
    fn test_identify_short_device() {
        let device = write_image("probe-short.img", &[0u8; 16]);
        let err = identify(&device).unwrap_err();
        assert!(matches!(err, ProbeError::Read(_)));
        assert_eq!(libc::EIO, err.errno());
        fs::remove_file(&device).unwrap();
    }

    #[test]
    fn test_identify_missing_device() {
        let device = DevicePath::new_tmp("probe-missing.img");
        let err = identify(&device).unwrap_err();
        assert!(matches!(err, ProbeError::Open { .. }));
        assert_eq!(libc::ENOENT, err.errno());
    }
}
