/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::{fs, path::Path};

use anyhow::Context;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub tools: ToolsConfig,
    pub ext3: Ext3Config,
    pub ext4: Ext4Config,
    /// Timeout in seconds for external utilities, none if not set
    pub timeout: Option<u32>,
}

/// Locations of the userspace utilities
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ToolsConfig {
    pub e2fsck: String,
    pub mke2fs: String,
    pub make_ext4fs: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Ext3Config {
    /// `mke2fs -b`
    pub block_size: u32,
    /// `mke2fs -m`
    pub reserved_percent: u8,
    /// `mke2fs -L`
    pub label: String,
    /// Permissions applied to mountpoint after successful mount
    pub mountpoint_mode: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Ext4Config {
    /// Pass `-J` to `make_ext4fs`
    pub no_journal: bool,
    /// Mount with `user_xattr` data
    pub user_xattr: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            e2fsck: "/system/bin/e2fsck".to_owned(),
            mke2fs: "/system/bin/mke2fs".to_owned(),
            make_ext4fs: "/system/bin/make_ext4fs".to_owned(),
        }
    }
}

impl Default for Ext3Config {
    fn default() -> Self {
        Self {
            block_size: 4096,
            reserved_percent: 1,
            label: "android".to_owned(),
            mountpoint_mode: 0o777,
        }
    }
}

impl Default for Ext4Config {
    fn default() -> Self {
        Self {
            no_journal: true,
            user_xattr: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!(
                "no configuration at '{}', using defaults",
                path.display()
            );
            return Ok(Config::default());
        }
        let config = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration file '{}'", path.display()))?;
        toml::from_str(&config)
            .with_context(|| format!("bad configuration file '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::default(), toml::from_str::<Config>("").unwrap());
    }

    #[test]
    fn test_partial_config() {
        let config = r#"
timeout = 30

[tools]
e2fsck = "/sbin/e2fsck"

[ext4]
user_xattr = true
"#;
        let config: Config = toml::from_str(config).unwrap();
        assert_eq!(Some(30), config.timeout);
        assert_eq!("/sbin/e2fsck", config.tools.e2fsck);
        assert_eq!("/system/bin/mke2fs", config.tools.mke2fs);
        assert!(config.ext4.user_xattr);
        assert!(config.ext4.no_journal);
        assert_eq!(4096, config.ext3.block_size);
    }

    #[test]
    fn test_long_timeout() {
        let config: Config = toml::from_str("timeout = 600\n").unwrap();
        assert_eq!(Some(600), config.timeout);
    }

    #[test]
    fn test_shipped_config() {
        let config = Config::load(Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml")))
            .unwrap();
        assert_eq!(Config::default(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let config = Config::load(Path::new("/nonexistent/extvol.toml")).unwrap();
        assert_eq!(Config::default(), config);
    }
}
