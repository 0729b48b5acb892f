/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use clap::{builder::PossibleValuesParser, Parser, Subcommand};
use extvol::filesystems::filesystems_available;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file in TOML format
    #[arg(long, default_value_t = String::from("./config.toml"))]
    pub config_path: String,

    #[clap(subcommand)]
    pub mode: Mode,
}

#[derive(Debug, PartialEq, Clone, Subcommand)]
#[clap(rename_all = "kebab_case")]
pub enum Mode {
    /// Look for ext superblock on device
    Identify {
        /// Filesystem helper to use
        #[arg(short, long)]
        #[clap(value_parser = PossibleValuesParser::new(filesystems_available()))]
        filesystem: String,
        /// Block device or image file
        #[arg(short, long)]
        device: String,
        /// Print superblock summary as JSON
        #[arg(short, long, default_value_t = false)]
        json: bool,
    },
    /// Run filesystem check
    Check {
        /// Filesystem helper to use
        #[arg(short, long)]
        #[clap(value_parser = PossibleValuesParser::new(filesystems_available()))]
        filesystem: String,
        /// Block device or image file
        #[arg(short, long)]
        device: String,
    },
    /// Make new filesystem on device
    Format {
        /// Filesystem helper to use
        #[arg(short, long)]
        #[clap(value_parser = PossibleValuesParser::new(filesystems_available()))]
        filesystem: String,
        /// Block device or image file
        #[arg(short, long)]
        device: String,
    },
    /// Mount device
    Mount {
        /// Filesystem helper to use
        #[arg(short, long)]
        #[clap(value_parser = PossibleValuesParser::new(filesystems_available()))]
        filesystem: String,
        /// Block device
        #[arg(short, long)]
        device: String,
        /// Directory to mount on
        #[arg(short, long)]
        mount_point: String,
        /// Mount read-only
        #[arg(short, long, default_value_t = false)]
        read_only: bool,
        /// Change flags of already mounted filesystem
        #[arg(long, default_value_t = false)]
        remount: bool,
        /// Allow executing binaries (ignored by ext3)
        #[arg(short, long, default_value_t = false)]
        executable: bool,
    },
}
