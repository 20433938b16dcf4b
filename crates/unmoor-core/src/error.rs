//! Core error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the teardown engine and the environment loader
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("environment file not found: {0}")]
    EnvironmentFileNotFound(PathBuf),

    #[error("KDL parse error: {0}")]
    Kdl(#[from] kdl::KdlError),

    #[error("missing required field '{0}' in environment definition")]
    MissingField(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("critical stage '{label}' failed: {message}")]
    StageFailed { label: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
