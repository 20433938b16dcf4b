//! kubectl CLI wrapper
//!
//! Wraps the kubectl commands used to unblock deletions. Every operation
//! here tolerates an already-absent object, because on a re-run the cluster
//! (or the whole control plane) may be gone.

use crate::error::{KubeError, Result};
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;

/// Outcome of a deletion that tolerates absence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// kubectl CLI wrapper, bound to the current context
pub struct Kubectl {
    context: Option<String>,
}

impl Kubectl {
    pub fn new() -> Self {
        Self { context: None }
    }

    /// Target a specific kubeconfig context instead of the current one
    pub fn with_context(context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
        }
    }

    /// Check if kubectl is installed
    pub async fn check_installed() -> Result<()> {
        let which = Command::new("which").arg("kubectl").output().await?;

        if !which.status.success() {
            return Err(KubeError::KubectlNotFound);
        }
        Ok(())
    }

    /// Run a kubectl command and return stdout
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("kubectl");
        if let Some(context) = &self.context {
            cmd.arg("--context").arg(context);
        }
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: kubectl {}", args.join(" "));

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KubeError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Delete a validating-webhook configuration.
    ///
    /// The load-balancer controller's webhook blocks Ingress deletion when
    /// the controller itself is unhealthy, so it goes first.
    pub async fn delete_validating_webhook(&self, name: &str) -> Result<DeleteOutcome> {
        let output = self
            .run_command(&[
                "delete",
                "validatingwebhookconfiguration",
                name,
                "--ignore-not-found",
            ])
            .await?;

        // --ignore-not-found exits 0 and prints nothing for a missing object
        if output.contains("deleted") {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }

    /// List every Ingress in the cluster across all namespaces
    pub async fn list_ingresses(&self) -> Result<Vec<IngressRef>> {
        let output = self
            .run_command(&["get", "ingress", "--all-namespaces", "-o", "json"])
            .await?;

        if output.trim().is_empty() {
            return Ok(Vec::new());
        }

        let list: IngressList = serde_json::from_str(&output)?;
        Ok(list
            .items
            .into_iter()
            .map(|item| IngressRef {
                namespace: item.metadata.namespace,
                name: item.metadata.name,
                finalizers: item.metadata.finalizers,
            })
            .collect())
    }

    /// Strip finalizer metadata from one Ingress so deletion cannot hang
    /// on a controller that will never reconcile it
    pub async fn strip_ingress_finalizers(&self, namespace: &str, name: &str) -> Result<()> {
        match self
            .run_command(&[
                "patch",
                "ingress",
                name,
                "-n",
                namespace,
                "--type=merge",
                "-p",
                r#"{"metadata":{"finalizers":null}}"#,
            ])
            .await
        {
            Ok(_) => Ok(()),
            // Deleted between list and patch: nothing left to unblock
            Err(KubeError::CommandFailed(stderr)) if is_not_found(&stderr) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Default for Kubectl {
    fn default() -> Self {
        Self::new()
    }
}

/// True when kubectl stderr reports the object as absent
pub fn is_not_found(stderr: &str) -> bool {
    stderr.contains("NotFound") || stderr.contains("not found")
}

/// One Ingress as seen by the finalizer-stripping pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressRef {
    pub namespace: String,
    pub name: String,
    pub finalizers: Vec<String>,
}

impl IngressRef {
    pub fn has_finalizers(&self) -> bool {
        !self.finalizers.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct IngressList {
    #[serde(default)]
    items: Vec<IngressItem>,
}

#[derive(Debug, Deserialize)]
struct IngressItem {
    metadata: IngressMetadata,
}

#[derive(Debug, Deserialize)]
struct IngressMetadata {
    name: String,
    namespace: String,
    #[serde(default)]
    finalizers: Vec<String>,
}
