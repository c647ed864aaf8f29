//! External process invocation.
//!
//! `ProcessRunner` is the only way the pipeline touches child processes, so
//! tests can swap in a fake and assert on the exact command lines.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

use crate::error::{PosterError, Result};

/// A fully formed invocation: executable plus arguments. No shell involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<OsString>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Value of a `--name=value` style argument, if present.
    pub fn flag_value(&self, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        self.args
            .iter()
            .filter_map(|a| a.to_str())
            .find_map(|a| a.strip_prefix(prefix.as_str()).map(str::to_string))
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Everything a finished child process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub trait ProcessRunner {
    /// Run to completion, blocking, with both streams captured in full.
    fn execute(&self, command: &CommandLine) -> std::io::Result<ProcessOutput>;

    /// Resolve `program` against the executable search path.
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Runs real child processes through `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn execute(&self, command: &CommandLine) -> std::io::Result<ProcessOutput> {
        let output = Command::new(&command.program).args(&command.args).output()?;
        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        let paths = env::var_os("PATH")?;
        env::split_paths(&paths).find_map(|dir| executable_in(&dir, program))
    }
}

fn executable_in(dir: &Path, program: &str) -> Option<PathBuf> {
    let candidate = dir.join(program);
    if is_executable(&candidate) {
        return Some(candidate);
    }
    if cfg!(windows) {
        let exe = candidate.with_extension("exe");
        if is_executable(&exe) {
            return Some(exe);
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Execute `command`, log its captured streams, and turn a non-zero exit into
/// `SubprocessFailed`.
pub fn run(runner: &dyn ProcessRunner, command: &CommandLine) -> Result<ProcessOutput> {
    info!(command = %command, "running subprocess");

    let output = runner.execute(command).map_err(|source| PosterError::Spawn {
        program: command.program.clone(),
        source,
    })?;

    for line in output.stdout.lines() {
        info!(target: "postergrid::subprocess", stream = "stdout", "{line}");
    }
    for line in output.stderr.lines() {
        info!(target: "postergrid::subprocess", stream = "stderr", "{line}");
    }

    if output.success() {
        info!(command = %command, "subprocess exited normally with return code 0");
        Ok(output)
    } else {
        warn!(command = %command, code = ?output.code, "subprocess exited with non-zero return code");
        Err(PosterError::SubprocessFailed {
            command: command.to_string(),
            code: output.code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
