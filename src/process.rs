// Process execution for version probes: timeout handling and output capture

use crate::error::{NodePathError, ProcessError, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

/// Process execution configuration
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub timeout: Option<Duration>,
}

impl ProcessConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Human readable command line, used in errors and logs
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Process execution result
#[derive(Debug)]
pub struct ProcessResult {
    pub exit_status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub duration: Duration,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_status.success()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_status.code()
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Turn a non-zero exit into a `ProcessError::NonZeroExit`
    pub fn into_success(self, command: String) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(NodePathError::Process(Box::new(ProcessError::NonZeroExit {
            command,
            exit_code: self.exit_code(),
            stderr: self.stderr(),
        })))
    }
}

/// Runs child processes on the tokio runtime
#[derive(Debug, Clone)]
pub struct ProcessManager {
    default_timeout: Duration,
}

impl ProcessManager {
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_default_timeout(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    pub async fn execute_async(&self, config: ProcessConfig) -> Result<ProcessResult> {
        use tokio::io::AsyncReadExt;
        use tokio::process::Command;
        use tokio::time::timeout;

        let start_time = std::time::Instant::now();
        let command_line = config.command_line();

        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            NodePathError::Process(Box::new(ProcessError::SpawnFailed {
                command: command_line.clone(),
                error: e.to_string(),
            }))
        })?;

        let timeout_duration = config.timeout.unwrap_or(self.default_timeout);

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();

        let execution_result = timeout(timeout_duration, async {
            let mut stdout_data = Vec::new();
            let mut stderr_data = Vec::new();

            // Drain both pipes together so a chatty stderr can't block stdout
            let read_stdout = async {
                if let Some(pipe) = stdout.as_mut() {
                    pipe.read_to_end(&mut stdout_data).await?;
                }
                Ok::<(), std::io::Error>(())
            };
            let read_stderr = async {
                if let Some(pipe) = stderr.as_mut() {
                    pipe.read_to_end(&mut stderr_data).await?;
                }
                Ok::<(), std::io::Error>(())
            };
            let (out, err) = tokio::join!(read_stdout, read_stderr);
            out.and(err).map_err(|e| {
                NodePathError::Process(Box::new(ProcessError::OutputCaptureFailed {
                    message: format!("Failed to read output: {e}"),
                    command: command_line.clone(),
                }))
            })?;

            let exit_status = child.wait().await.map_err(|e| {
                NodePathError::Process(Box::new(ProcessError::OutputCaptureFailed {
                    message: format!("Failed to wait for process: {e}"),
                    command: command_line.clone(),
                }))
            })?;

            Ok::<ProcessResult, NodePathError>(ProcessResult {
                exit_status,
                stdout: stdout_data,
                stderr: stderr_data,
                duration: start_time.elapsed(),
            })
        })
        .await;

        match execution_result {
            Ok(result) => result,
            Err(_) => {
                // Timed out; kill_on_drop reaps the child when it goes out of scope
                Err(NodePathError::Process(Box::new(ProcessError::Timeout {
                    command: command_line,
                    duration: timeout_duration,
                })))
            }
        }
    }
}

impl Default for ProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_config_builder() {
        let config = ProcessConfig::new("/usr/bin/geth")
            .with_args(["version"])
            .with_timeout(Duration::from_millis(1500));

        assert_eq!(config.program, PathBuf::from("/usr/bin/geth"));
        assert_eq!(config.args, vec![OsString::from("version")]);
        assert_eq!(config.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.command_line(), "/usr/bin/geth version");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_captures_stdout() {
        let manager = ProcessManager::new();
        let result = manager
            .execute_async(ProcessConfig::new("echo").with_args(["Version: 1.8.2"]))
            .await
            .unwrap();
        assert!(result.success());
        assert_eq!(result.stdout().trim(), "Version: 1.8.2");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_non_zero_exit() {
        let manager = ProcessManager::new();
        let result = manager.execute_async(ProcessConfig::new("false")).await.unwrap();
        assert!(!result.success());
        assert!(result.into_success("false".to_string()).is_err());
    }

    #[tokio::test]
    async fn test_execute_spawn_failure() {
        let manager = ProcessManager::new();
        let result = manager
            .execute_async(ProcessConfig::new("/nonexistent/nodepath-client-binary"))
            .await;
        match result {
            Err(NodePathError::Process(err)) => {
                assert!(matches!(*err, ProcessError::SpawnFailed { .. }))
            }
            other => panic!("expected SpawnFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_timeout() {
        let manager = ProcessManager::new();
        let result = manager
            .execute_async(
                ProcessConfig::new("sleep")
                    .with_args(["5"])
                    .with_timeout(Duration::from_millis(100)),
            )
            .await;
        match result {
            Err(NodePathError::Process(err)) => {
                assert!(matches!(*err, ProcessError::Timeout { .. }))
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
    }
}
