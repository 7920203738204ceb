use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::DiffToolError;

/// Captured result of one git invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// `git diff` reports "differences found" with status 1.
    pub fn diff_success(&self) -> bool {
        matches!(self.exit_code, Some(0) | Some(1))
    }
}

/// Port through which every version-control call goes. Swapped for a
/// scripted double in tests.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run git with `args`. Only a failure to start the process is an error;
    /// non-zero exits come back as a normal `CommandOutput`.
    async fn run(&self, args: &[String]) -> Result<CommandOutput, DiffToolError>;
}

/// Runs the system `git` binary inside a working directory.
#[derive(Debug, Clone)]
pub struct GitRunner {
    cwd: PathBuf,
}

impl GitRunner {
    pub fn new<P: AsRef<Path>>(cwd: P) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
        }
    }
}

impl CommandRunner for GitRunner {
    #[tracing::instrument(name = "Running git", level = "debug", skip(self))]
    async fn run(&self, args: &[String]) -> Result<CommandOutput, DiffToolError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .output()
            .await?;
        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };
        debug!("git exited with {:?}", result.exit_code);
        trace!("git stdout: {}", result.stdout);
        Ok(result)
    }
}
