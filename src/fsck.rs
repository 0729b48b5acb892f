/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::path::Path;

use log::{error, info, warn};
use thiserror::Error;

use crate::{
    command::{CommandInterface, CommandWrapper, ExecError},
    path::DevicePath,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Clean,
    Corrected,
    /// Checker is not installed
    Skipped,
}

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("filesystem had corrected errors (system should be rebooted)")]
    RebootRequired,
    #[error("filesystem had uncorrectable errors")]
    Uncorrectable,
    #[error("operational error while checking filesystem")]
    Operational,
    #[error("filesystem check failed (unknown exit code {0})")]
    UnknownExitCode(i32),
    #[error("failed to run filesystem check")]
    Exec(#[from] ExecError),
}

impl CheckError {
    pub fn errno(&self) -> i32 {
        libc::EIO
    }
}

/// Run `e2fsck -v -p` (preen) on `device` and interpret its exit code.
pub fn run_check(
    cmdi: &dyn CommandInterface,
    e2fsck: &Path,
    device: &DevicePath,
    timeout: Option<u32>,
) -> Result<CheckOutcome, CheckError> {
    if !cmdi.is_executable(e2fsck) {
        warn!("skipping filesystem check, '{}' not found", e2fsck.display());
        return Ok(CheckOutcome::Skipped);
    }

    let mut fsck = CommandWrapper::new(e2fsck);
    fsck.arg("-v").arg("-p").arg(device.as_ref());
    let code = cmdi.exec(fsck, timeout).map_err(|err| {
        error!("filesystem check of '{}' failed to run: {}", device, err);
        err
    })?;

    let result = interpret_exit_code(code);
    match &result {
        Ok(CheckOutcome::Clean) => info!("filesystem had no errors"),
        Ok(CheckOutcome::Corrected) => info!("filesystem had corrected errors"),
        Ok(CheckOutcome::Skipped) => {}
        Err(err) => error!("{}", err),
    }
    result
}

fn interpret_exit_code(code: i32) -> Result<CheckOutcome, CheckError> {
    match code {
        0 => Ok(CheckOutcome::Clean),
        1 => Ok(CheckOutcome::Corrected),
        2 => Err(CheckError::RebootRequired),
        4 => Err(CheckError::Uncorrectable),
        8 => Err(CheckError::Operational),
        code => Err(CheckError::UnknownExitCode(code)),
    }
}
