//! AWS integration error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("AWS authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("AWS API error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, AwsError>;
