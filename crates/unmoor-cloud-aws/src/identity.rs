//! Cloud identity check
//!
//! A read-only STS call that must succeed before any destructive action.
//! Failure here means the credential chain is empty or expired, and the
//! run aborts without having touched anything.

use crate::error::{AwsError, Result};
use aws_config::SdkConfig;
use aws_sdk_sts::error::DisplayErrorContext;

/// The active cloud identity
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub account_id: String,
    pub arn: String,
}

impl std::fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.account_id, self.arn)
    }
}

/// Resolve the caller identity, or fail with an authentication error
pub async fn check_caller(config: &SdkConfig) -> Result<CallerIdentity> {
    let client = aws_sdk_sts::Client::new(config);

    let output = client
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| AwsError::AuthenticationFailed(format!("{}", DisplayErrorContext(&e))))?;

    let account_id = output
        .account()
        .ok_or_else(|| AwsError::AuthenticationFailed("no account id in STS response".into()))?
        .to_string();
    let arn = output.arn().unwrap_or_default().to_string();

    tracing::debug!(%account_id, %arn, "caller identity resolved");

    Ok(CallerIdentity { account_id, arn })
}
