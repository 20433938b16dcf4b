//! AWS SDK integration for Unmoor
//!
//! Three concerns live here, all direct AWS API work that Terraform cannot
//! do for us:
//!
//! - **Identity check**: STS caller identity, the read-only gate before
//!   anything destructive runs
//! - **Orphan reclaimer**: sweep of load balancers, target groups and
//!   security groups the in-cluster controller created outside Terraform's
//!   graph and may have left behind
//! - **Node terminator**: termination of Karpenter-provisioned instances
//!   that no Terraform state tracks

pub mod error;
pub mod identity;
pub mod nodes;
pub mod orphans;

pub use error::{AwsError, Result};
pub use identity::{CallerIdentity, check_caller};
pub use nodes::{NodeTerminator, TerminationOutcome};
pub use orphans::{OrphanReclaimer, SweepCounts, SweepReport, is_owned_by};

use aws_config::{BehaviorVersion, Region};
pub use aws_config::SdkConfig;

/// Load the shared SDK configuration for the environment's region.
///
/// Credential resolution follows the default AWS chain (env vars, profile,
/// instance metadata); this crate never handles credentials itself.
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}
