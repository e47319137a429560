//! Vendor tool execution.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::ToolError;

/// Deadline applied when a caller does not set one.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(3600);

/// Locate `tool` on the search path.
pub fn locate(tool: &str) -> Result<PathBuf, ToolError> {
    which::which(tool).map_err(|_| ToolError::not_found(tool))
}

/// Whether `tool` is on the search path.
pub fn is_available(tool: &str) -> bool {
    which::which(tool).is_ok()
}

/// Captured output of a successful tool run.
#[derive(Debug, Default)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ToolOutput {
    /// Stdout decoded lossily.
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

enum Input {
    Inherit,
    File(PathBuf),
    Bytes(Vec<u8>),
}

/// A single invocation of an external tool.
///
/// Environment variables set here apply to the child only, which is how
/// credentials such as `MYSQL_PWD` and `PGPASSWORD` are passed.
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
    envs: Vec<(String, String)>,
    input: Input,
    timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            input: Input::Inherit,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Feed the contents of `path` to the child's stdin.
    pub fn stdin_file(mut self, path: impl AsRef<Path>) -> Self {
        self.input = Input::File(path.as_ref().to_path_buf());
        self
    }

    /// Feed `bytes` to the child's stdin.
    pub fn stdin_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.input = Input::Bytes(bytes.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the tool to completion and capture its output.
    ///
    /// Fails with [`ToolError::NotFound`] before spawning when the tool is not
    /// on `PATH`. The child is killed if the deadline passes.
    pub async fn output(self) -> Result<ToolOutput, ToolError> {
        let path = locate(&self.program)?;

        let mut cmd = Command::new(&path);
        cmd.args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        let mut pending_input = None;
        match self.input {
            Input::Inherit => {
                cmd.stdin(Stdio::null());
            }
            Input::File(file) => {
                let file = std::fs::File::open(&file)?;
                cmd.stdin(Stdio::from(file));
            }
            Input::Bytes(bytes) => {
                cmd.stdin(Stdio::piped());
                pending_input = Some(bytes);
            }
        }

        debug!("Running {} with {} args", self.program, self.args.len());

        let mut child = cmd.spawn().map_err(|e| ToolError::Spawn {
            tool: self.program.clone(),
            source: e,
        })?;

        if let (Some(bytes), Some(mut stdin)) = (pending_input, child.stdin.take()) {
            // Written concurrently so a chatty child cannot deadlock on a full stdout pipe.
            tokio::spawn(async move {
                let _ = stdin.write_all(&bytes).await;
                let _ = stdin.shutdown().await;
            });
        }

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ToolError::Timeout {
                tool: self.program.clone(),
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| ToolError::Spawn {
                tool: self.program.clone(),
                source: e,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if output.status.success() {
            Ok(ToolOutput {
                stdout: output.stdout,
                stderr,
            })
        } else {
            Err(ToolError::Failed {
                tool: self.program,
                code: output.status.code().unwrap_or(-1),
                stderr,
            })
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
