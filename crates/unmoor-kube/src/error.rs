//! kubectl adapter error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KubeError {
    #[error("kubectl not found. Please install: https://kubernetes.io/docs/tasks/tools/")]
    KubectlNotFound,

    #[error("kubectl command failed: {0}")]
    CommandFailed(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KubeError>;
