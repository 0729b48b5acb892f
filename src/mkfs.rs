/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use log::{error, info};
use thiserror::Error;

use crate::{
    command::{CommandInterface, CommandWrapper, ExecError},
    path::DevicePath,
};

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("format failed (unknown exit code {0})")]
    Failed(i32),
    #[error("failed to run format utility")]
    Exec(#[from] ExecError),
}

impl FormatError {
    pub fn errno(&self) -> i32 {
        libc::EIO
    }
}

/// Run `program args... device`, any non-zero exit code is a failure.
pub fn run_format(
    cmdi: &dyn CommandInterface,
    fs_name: &str,
    program: &str,
    args: &[String],
    device: &DevicePath,
    timeout: Option<u32>,
) -> Result<(), FormatError> {
    let mut mkfs = CommandWrapper::new(program);
    for arg in args {
        mkfs.arg(arg);
    }
    mkfs.arg(device.as_ref());

    let code = cmdi.exec(mkfs, timeout).map_err(|err| {
        error!("format ({}) of '{}' failed to run: {}", fs_name, device, err);
        err
    })?;
    if code == 0 {
        info!("filesystem ({}) formatted OK", fs_name);
        Ok(())
    } else {
        error!("format ({}) failed (unknown exit code {})", fs_name, code);
        Err(FormatError::Failed(code))
    }
}
