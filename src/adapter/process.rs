//! Running external converter tools as child processes.
//!
//! Every adapter ends up spawning one command per file. This module owns the
//! spawn / capture / exit-status mapping so the adapters only assemble
//! arguments. Environment overrides are applied to the child only; the
//! parent process environment is never touched.

use crate::adapter::AdapterId;
use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// How many trailing stderr lines are kept in a [`FileError::ToolFailed`].
const STDERR_TAIL_LINES: usize = 20;

/// A program plus leading arguments, e.g. `python3` or `uv run docling`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a leading argument that precedes every invocation's own arguments.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// A fresh `Command` with the program and leading arguments applied.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Program name for messages.
    pub fn display_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Check that the tool starts and exits cleanly with `probe_args`
    /// (typically `--version`).
    pub async fn probe<I, S>(&self, probe_args: I) -> Result<(), String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let status = self
            .command()
            .args(probe_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| launch_hint(&self.display_name(), &e))?;

        if status.success() {
            Ok(())
        } else {
            Err(format!(
                "'{}' is installed but its probe exited with {status}",
                self.display_name()
            ))
        }
    }
}

/// Captured output of a successful tool run.
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `cmd` to completion, capturing stdout/stderr.
///
/// A non-zero exit becomes [`FileError::ToolFailed`] carrying the tail of
/// stderr, which is where all three tools print their Python tracebacks.
pub async fn run_tool(tool: AdapterId, mut cmd: Command) -> Result<ToolOutput, FileError> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    debug!("[{}] running {:?}", tool, cmd.as_std());

    let output = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| FileError::ToolLaunch {
            detail: launch_hint(&program, &e),
            program,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(FileError::ToolFailed {
            tool,
            code: output.status.code(),
            stderr: tail_lines(&stderr, STDERR_TAIL_LINES),
        });
    }

    if !stdout.trim().is_empty() {
        debug!("[{}] stdout: {}", tool, stdout.trim_end());
    }
    Ok(ToolOutput { stdout, stderr })
}

fn launch_hint(program: &str, e: &std::io::Error) -> String {
    if e.kind() == std::io::ErrorKind::NotFound {
        format!("'{program}' not found. Is it installed and on PATH?")
    } else {
        e.to_string()
    }
}

/// Last `n` non-empty lines of `s`, joined with newlines.
fn tail_lines(s: &str, n: usize) -> String {
    let lines: Vec<&str> = s.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
