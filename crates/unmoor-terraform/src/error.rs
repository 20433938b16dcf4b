//! Terraform adapter error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerraformError {
    #[error("terraform not found. Please install: https://developer.hashicorp.com/terraform/install")]
    TerraformNotFound,

    #[error("terraform init failed: {0}")]
    InitFailed(String),

    #[error("workspace not found: {0}")]
    WorkspaceNotFound(String),

    #[error("terraform destroy failed (target: {target}, exit status: {status})")]
    DestroyFailed { target: String, status: i32 },

    #[error("terraform command failed: {0}")]
    CommandFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TerraformError>;
