//! Karpenter node termination
//!
//! Karpenter provisions EC2 instances directly, so Terraform's state never
//! tracks them and `destroy` never removes them. They are discovered by the
//! discovery tag Karpenter stamps on everything it launches, terminated,
//! and then polled until gone. Destroying the cluster while its nodes are
//! still attached is how node-group deletion ends up hanging.

use crate::error::{AwsError, Result};
use aws_config::SdkConfig;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::{Filter, InstanceStateName};
use unmoor_core::{WaitConfig, WaitOutcome, wait_until};

/// Tag Karpenter stamps on instances it provisions
const KARPENTER_DISCOVERY_TAG: &str = "karpenter.sh/discovery";

/// Result of terminating the externally provisioned nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// No Karpenter-provisioned instances existed
    NoneFound,
    /// All discovered instances reached `terminated`
    Terminated(usize),
    /// Termination was submitted but some instances were still shutting
    /// down when the wait gave up; reported as a warning by the caller
    TimedOut(usize),
}

/// Terminates Karpenter-provisioned instances for one cluster
pub struct NodeTerminator {
    ec2: aws_sdk_ec2::Client,
    cluster_name: String,
}

impl NodeTerminator {
    pub fn new(config: &SdkConfig, cluster_name: impl Into<String>) -> Self {
        Self {
            ec2: aws_sdk_ec2::Client::new(config),
            cluster_name: cluster_name.into(),
        }
    }

    /// Instance ids of live Karpenter-provisioned nodes for this cluster
    pub async fn list_unmanaged_nodes(&self) -> Result<Vec<String>> {
        let tag_filter = Filter::builder()
            .name(format!("tag:{}", KARPENTER_DISCOVERY_TAG))
            .values(&self.cluster_name)
            .build();
        let state_filter = Filter::builder()
            .name("instance-state-name")
            .values("pending")
            .values("running")
            .values("stopping")
            .values("stopped")
            .build();

        let output = self
            .ec2
            .describe_instances()
            .filters(tag_filter)
            .filters(state_filter)
            .send()
            .await
            .map_err(|e| AwsError::Api(format!("{}", DisplayErrorContext(&e))))?;

        let ids = output
            .reservations
            .unwrap_or_default()
            .into_iter()
            .flat_map(|r| r.instances.unwrap_or_default())
            .filter_map(|i| i.instance_id)
            .collect();

        Ok(ids)
    }

    /// Terminate the discovered nodes and poll until every one reports
    /// `terminated` or the wait gives up.
    pub async fn terminate_and_wait(&self, wait: &WaitConfig) -> Result<TerminationOutcome> {
        let ids = self.list_unmanaged_nodes().await?;
        if ids.is_empty() {
            return Ok(TerminationOutcome::NoneFound);
        }

        tracing::debug!(count = ids.len(), "terminating Karpenter-provisioned nodes");

        self.ec2
            .terminate_instances()
            .set_instance_ids(Some(ids.clone()))
            .send()
            .await
            .map_err(|e| AwsError::Api(format!("{}", DisplayErrorContext(&e))))?;

        let outcome = wait_until(wait, || self.all_terminated(&ids)).await;

        match outcome {
            WaitOutcome::Satisfied => Ok(TerminationOutcome::Terminated(ids.len())),
            WaitOutcome::GaveUp => Ok(TerminationOutcome::TimedOut(ids.len())),
        }
    }

    /// Probe: true once every instance reports `terminated`. API errors
    /// read as "not yet" so the polling loop keeps going.
    async fn all_terminated(&self, ids: &[String]) -> bool {
        let output = match self
            .ec2
            .describe_instances()
            .set_instance_ids(Some(ids.to_vec()))
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!("describe while waiting failed: {}", DisplayErrorContext(&e));
                return false;
            }
        };

        output
            .reservations
            .unwrap_or_default()
            .iter()
            .flat_map(|r| r.instances())
            .all(|i| {
                i.state()
                    .and_then(|s| s.name())
                    .is_some_and(|name| *name == InstanceStateName::Terminated)
            })
    }
}
