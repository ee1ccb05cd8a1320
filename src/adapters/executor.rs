//! System Command Executor
//!
//! Implements the `CommandExecutor` port by spawning real processes through
//! `tokio::process`. Kept as thin as possible so everything above it stays
//! testable with a fake executor.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::ports::CommandExecutor;
use crate::error::{Error, Result};

/// Executor spawning external utilities on the local node.
///
/// Captures stdout and stderr and returns them as one string, stdout first.
/// Exit status handling follows the port contract: output is preserved even
/// when the process fails.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandExecutor;

impl SystemCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for SystemCommandExecutor {
    async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        debug!(program, ?args, "executing command");

        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| Error::CommandSpawn {
                program: program.to_string(),
                source,
            })?;

        let combined = combine_output(&output.stdout, &output.stderr);

        if output.status.success() {
            Ok(combined)
        } else {
            Err(Error::CommandFailed {
                program: program.to_string(),
                status: output.status.code().unwrap_or(-1),
                output: combined,
            })
        }
    }
}

fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    let stderr = String::from_utf8_lossy(stderr);
    if !stderr.is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&stderr);
    }
    combined
}
