/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::{path::Path, process};

use anyhow::{anyhow, Context};
use args::{Args, Mode};
use clap::Parser;
use extvol::{
    command::LocalCommandInterface,
    config::Config,
    filesystems::filesystem_by_name,
    fsck::CheckError,
    mkfs::FormatError,
    mount::{flags::MountOptions, syscall::LocalMountInterface, ExtFileSystem, MountError},
    path::{DevicePath, MountPoint},
    probe::ProbeError,
};
use log::{error, info, LevelFilter};
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config as LogConfig, Root},
    encode::pattern::PatternEncoder,
};

mod args;

const LOG_CONFIG_PATH: &str = "log4rs.yml";

fn main() {
    let args = Args::parse();

    if let Err(err) = init_logger() {
        eprintln!("failed to init logger: {:?}", err);
        process::exit(1);
    }
    info!("init logger");

    if let Err(err) = run(args) {
        error!("{:?}", err);
        process::exit(errno_of(&err));
    }
}

fn init_logger() -> anyhow::Result<()> {
    if Path::new(LOG_CONFIG_PATH).exists() {
        log4rs::init_file(LOG_CONFIG_PATH, Default::default())
            .with_context(|| format!("bad logger configuration '{}'", LOG_CONFIG_PATH))?;
        return Ok(());
    }
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {h({l})} {t} - {m}{n}")))
        .build();
    let config = LogConfig::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Info))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn lookup(name: &str) -> anyhow::Result<&'static dyn ExtFileSystem> {
    filesystem_by_name(name).ok_or_else(|| anyhow!("unknown filesystem '{}'", name))
}

fn run(args: Args) -> anyhow::Result<()> {
    info!("read configuration");
    let config = Config::load(Path::new(&args.config_path))?;
    let cmdi = LocalCommandInterface::new();

    match args.mode {
        Mode::Identify {
            filesystem,
            device,
            json,
        } => {
            let fs = lookup(&filesystem)?;
            let device = DevicePath::new(Path::new(&device));
            let sb = fs
                .identify(&device)
                .with_context(|| format!("failed to identify '{}'", device))?;
            if json {
                let json = serde_json::to_string_pretty(&sb)
                    .with_context(|| "failed to serialize superblock")?;
                println!("{}", json);
            } else {
                println!("{}: {} uuid={} label='{}'", device, sb.kind, sb.uuid, sb.label);
            }
        }
        Mode::Check { filesystem, device } => {
            let fs = lookup(&filesystem)?;
            let device = DevicePath::new(Path::new(&device));
            let outcome = fs
                .check(&cmdi, &config, &device)
                .with_context(|| format!("failed to check '{}'", device))?;
            info!("check of '{}' finished: {:?}", device, outcome);
        }
        Mode::Format { filesystem, device } => {
            let fs = lookup(&filesystem)?;
            let device = DevicePath::new(Path::new(&device));
            fs.format(&cmdi, &config, &device)
                .with_context(|| format!("failed to format '{}'", device))?;
        }
        Mode::Mount {
            filesystem,
            device,
            mount_point,
            read_only,
            remount,
            executable,
        } => {
            let fs = lookup(&filesystem)?;
            let device = DevicePath::new(Path::new(&device));
            let mountpoint = MountPoint::new(Path::new(&mount_point));
            let opts = MountOptions {
                read_only,
                remount,
                executable,
            };
            let mounted = fs
                .mount(&LocalMountInterface::new(), &config, &device, &mountpoint, opts)
                .with_context(|| format!("failed to mount '{}'", device))?;
            info!("mount flags {:?}", mounted.flags);
        }
    }
    Ok(())
}

/// Exit with the errno the storage manager would have returned.
fn errno_of(err: &anyhow::Error) -> i32 {
    if let Some(err) = err.downcast_ref::<ProbeError>() {
        err.errno()
    } else if let Some(err) = err.downcast_ref::<CheckError>() {
        err.errno()
    } else if let Some(err) = err.downcast_ref::<FormatError>() {
        err.errno()
    } else if let Some(err) = err.downcast_ref::<MountError>() {
        err.errno()
    } else {
        1
    }
}
