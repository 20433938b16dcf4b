//! Environment definition
//!
//! An environment is one named, region-scoped deployment of the demo stack.
//! It is loaded once from a KDL file at startup and stays immutable for the
//! whole run; every component receives it by reference instead of reading
//! process-global state.

use crate::error::{CoreError, Result};
use kdl::{KdlDocument, KdlNode};
use std::fs;
use std::path::Path;

/// Cluster-name prefix used when the environment file does not override it
pub const DEFAULT_CLUSTER_PREFIX: &str = "eks-demo";

/// How worker nodes are managed for this environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeMode {
    /// EKS managed node groups, fully tracked by the Terraform state
    #[default]
    Managed,
    /// Karpenter provisions nodes outside the Terraform state; teardown
    /// needs the extra autoscaler stages
    Karpenter,
}

impl std::fmt::Display for NodeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeMode::Managed => write!(f, "managed"),
            NodeMode::Karpenter => write!(f, "karpenter"),
        }
    }
}

/// A named, region-scoped deployment instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Unique environment name; also the Terraform workspace name
    pub name: String,

    /// AWS region the environment lives in
    pub region: String,

    /// Prefix for the derived cluster name
    pub cluster_prefix: String,

    /// Node management variant
    pub node_mode: NodeMode,
}

impl Environment {
    /// The EKS cluster name derived from prefix and environment name.
    ///
    /// This identifier keys the ownership tags on controller-created AWS
    /// resources, so it must match what the provisioning side produced.
    pub fn cluster_name(&self) -> String {
        format!("{}-{}-cluster", self.cluster_prefix, self.name)
    }
}

/// Load an environment definition from a KDL file
pub fn load_environment<P: AsRef<Path>>(path: P) -> Result<Environment> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CoreError::EnvironmentFileNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    parse_environment(&content)
}

/// Parse an environment definition from a KDL string
pub fn parse_environment(content: &str) -> Result<Environment> {
    let doc: KdlDocument = content.parse()?;

    let mut name: Option<String> = None;
    let mut region: Option<String> = None;
    let mut cluster_prefix = DEFAULT_CLUSTER_PREFIX.to_string();
    let mut node_mode = NodeMode::default();

    for node in doc.nodes() {
        match node.name().value() {
            "name" => name = first_string(node),
            "region" => region = first_string(node),
            "cluster_prefix" => {
                if let Some(prefix) = first_string(node) {
                    cluster_prefix = prefix;
                }
            }
            "node_mode" => {
                let value = first_string(node).unwrap_or_default();
                node_mode = match value.as_str() {
                    "managed" | "" => NodeMode::Managed,
                    "karpenter" => NodeMode::Karpenter,
                    other => {
                        return Err(CoreError::InvalidConfig(format!(
                            "unknown node_mode '{}' (expected 'managed' or 'karpenter')",
                            other
                        )));
                    }
                };
            }
            // Unknown nodes are ignored so the same file can carry
            // provisioning-side settings this tool does not care about.
            _ => {}
        }
    }

    let name = name
        .filter(|n| !n.is_empty())
        .ok_or(CoreError::MissingField("name"))?;
    let region = region
        .filter(|r| !r.is_empty())
        .ok_or(CoreError::MissingField("region"))?;

    Ok(Environment {
        name,
        region,
        cluster_prefix,
        node_mode,
    })
}

fn first_string(node: &KdlNode) -> Option<String> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}
