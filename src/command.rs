/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::{
    ffi::{CString, OsStr},
    os::unix::ffi::OsStrExt,
    path::Path,
    process::{Command, Output},
};

use log::debug;
use thiserror::Error;

/// Exit code of `timeout` when the wrapped command ran out of time
const TIMEOUT_EXIT_CODE: i32 = 124;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to spawn: {0}")]
    Spawn(String),
    #[error("timed out: {0}")]
    TimedOut(String),
    #[error("terminated by signal: {0}")]
    Signaled(String),
}

pub trait CommandInterface {
    /// Whether `program` exists and may be executed.
    fn is_executable(&self, program: &Path) -> bool;

    /// Run command to completion and return its exit code.
    /// Output of the command is written to the log.
    fn exec(&self, cmd: CommandWrapper, timeout: Option<u32>) -> Result<i32, ExecError>;
}

pub struct CommandWrapper {
    internal: Command,
}

impl CommandWrapper {
    pub fn new<S: AsRef<OsStr>>(cmd: S) -> Self {
        Self {
            internal: Command::new(cmd),
        }
    }
    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Self {
        self.internal.arg(arg);
        self
    }
    pub fn get_program(&self) -> &OsStr {
        self.internal.get_program()
    }
    pub fn get_args(&self) -> Vec<&OsStr> {
        self.internal.get_args().collect()
    }
    pub fn exec_local(mut self, timeout: Option<u32>) -> Result<i32, ExecError> {
        debug!("run {:?}", self.internal);
        let output = match timeout {
            Some(secs) => {
                let mut timeout = Command::new("timeout");
                timeout.arg(secs.to_string());
                timeout.arg(self.internal.get_program());
                timeout.args(self.internal.get_args());
                timeout.output()
            }
            None => self.internal.output(),
        };
        let output = output.map_err(|v| {
            ExecError::Spawn(format!("failed to run command: {:?}\n{}", self.internal, v))
        })?;
        self.log_output(&output);
        match output.status.code() {
            Some(TIMEOUT_EXIT_CODE) if timeout.is_some() => Err(ExecError::TimedOut(format!(
                "command {:?} timed out",
                self.internal
            ))),
            Some(code) => Ok(code),
            None => Err(ExecError::Signaled(format!(
                "command {:?} execution terminated by signal",
                self.internal
            ))),
        }
    }
    fn log_output(&self, output: &Output) {
        let program = Path::new(self.internal.get_program())
            .file_name()
            .unwrap_or_default()
            .to_string_lossy();
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!("{}: {}", program, line);
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            debug!("{}: {}", program, line);
        }
    }
}

pub struct LocalCommandInterface {}

impl LocalCommandInterface {
    pub fn new() -> Self {
        LocalCommandInterface {}
    }
}

impl Default for LocalCommandInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandInterface for LocalCommandInterface {
    fn is_executable(&self, program: &Path) -> bool {
        let Ok(path) = CString::new(program.as_os_str().as_bytes()) else {
            return false;
        };
        if program.is_dir() {
            return false;
        }
        unsafe { libc::access(path.as_ptr(), libc::X_OK) == 0 }
    }

    fn exec(&self, cmd: CommandWrapper, timeout: Option<u32>) -> Result<i32, ExecError> {
        cmd.exec_local(timeout)
    }
}
