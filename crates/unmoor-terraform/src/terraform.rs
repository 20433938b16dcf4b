//! terraform CLI wrapper
//!
//! Wraps the terraform CLI commands used during teardown.

use crate::classify::{InitOutcome, is_state_checksum_mismatch};
use crate::error::{Result, TerraformError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// terraform CLI wrapper, scoped to one working directory
pub struct Terraform {
    workdir: PathBuf,
}

impl Terraform {
    pub fn new(workdir: impl AsRef<Path>) -> Self {
        Self {
            workdir: workdir.as_ref().to_path_buf(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Check that terraform is installed
    pub async fn check_installed() -> Result<()> {
        let which = Command::new("which").arg("terraform").output().await?;

        if !which.status.success() {
            return Err(TerraformError::TerraformNotFound);
        }
        Ok(())
    }

    /// Run a terraform command with captured output
    async fn run_captured(&self, args: &[&str]) -> Result<std::process::Output> {
        let mut cmd = Command::new("terraform");
        cmd.current_dir(&self.workdir);
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: terraform {}", args.join(" "));

        Ok(cmd.output().await?)
    }

    /// Initialize the backend.
    ///
    /// The known S3/DynamoDB consistency mismatch is downgraded to
    /// [`InitOutcome::StateChecksumMismatch`]; any other failure is fatal.
    pub async fn init(&self) -> Result<InitOutcome> {
        let output = self.run_captured(&["init", "-input=false"]).await?;

        if output.status.success() {
            return Ok(InitOutcome::Clean);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        if is_state_checksum_mismatch(&stderr) || is_state_checksum_mismatch(&stdout) {
            tracing::warn!(
                "backend state digest mismatch on init (eventual consistency), proceeding"
            );
            return Ok(InitOutcome::StateChecksumMismatch);
        }

        Err(TerraformError::InitFailed(stderr.trim().to_string()))
    }

    /// Select the workspace matching the environment name
    pub async fn select_workspace(&self, name: &str) -> Result<()> {
        let output = self.run_captured(&["workspace", "select", name]).await?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("doesn't exist") || stderr.contains("does not exist") {
            return Err(TerraformError::WorkspaceNotFound(name.to_string()));
        }
        Err(TerraformError::CommandFailed(stderr.trim().to_string()))
    }

    /// True when a workspace with this name exists
    pub async fn workspace_exists(&self, name: &str) -> Result<bool> {
        let output = self.run_captured(&["workspace", "list"]).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TerraformError::CommandFailed(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        // `terraform workspace list` marks the current workspace with `*`
        Ok(stdout
            .lines()
            .map(|line| line.trim_start_matches('*').trim())
            .any(|ws| ws == name))
    }

    /// Destroy a single resource address.
    ///
    /// terraform exits 0 when the target no longer exists in state, which
    /// is what makes re-runs safe.
    pub async fn destroy_target(&self, target: &str) -> Result<()> {
        self.destroy(Some(target)).await
    }

    /// Destroy everything remaining in the graph
    pub async fn destroy_all(&self) -> Result<()> {
        self.destroy(None).await
    }

    async fn destroy(&self, target: Option<&str>) -> Result<()> {
        let args = destroy_args(target);

        let mut cmd = Command::new("terraform");
        cmd.current_dir(&self.workdir);
        cmd.args(&args);
        // Destroy output is the user's progress feed; stream it through.
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        tracing::debug!("Running: terraform {}", args.join(" "));

        let status = cmd.status().await?;
        if status.success() {
            return Ok(());
        }

        Err(TerraformError::DestroyFailed {
            target: target.unwrap_or("(all)").to_string(),
            status: status.code().unwrap_or(-1),
        })
    }
}

fn destroy_args(target: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "destroy".to_string(),
        "-auto-approve".to_string(),
        "-input=false".to_string(),
    ];
    if let Some(target) = target {
        args.push(format!("-target={}", target));
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destroy_args_targeted() {
        assert_eq!(
            destroy_args(Some("kubernetes_deployment.app")),
            vec![
                "destroy",
                "-auto-approve",
                "-input=false",
                "-target=kubernetes_deployment.app"
            ]
        );
    }

    #[test]
    fn test_destroy_args_full() {
        assert_eq!(
            destroy_args(None),
            vec!["destroy", "-auto-approve", "-input=false"]
        );
    }

    #[test]
    fn test_workdir_is_kept() {
        let tf = Terraform::new("/tmp/infra");
        assert_eq!(tf.workdir(), Path::new("/tmp/infra"));
    }
}
