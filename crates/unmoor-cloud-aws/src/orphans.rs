//! Orphaned resource reclaimer
//!
//! The AWS load-balancer controller creates ELBv2 and EC2 resources in
//! reaction to Kubernetes objects, so they never appear in Terraform's
//! graph. If the controller was unhealthy (or already deleted) when its
//! objects went away, those resources stay behind and keep billing until
//! someone removes them. This sweep is the safety net that runs after the
//! authoritative destroy pass.
//!
//! Every deletion here is best-effort: the primary deletion path is the
//! controller's own reconciliation, and a sweep failure only means the
//! resource is reported instead of reclaimed.

use crate::error::AwsError;
use aws_config::SdkConfig;
use aws_sdk_ec2::types::Filter;
use aws_sdk_elasticloadbalancingv2::error::DisplayErrorContext;

/// Name prefix the load-balancer controller gives every resource it creates
const CONTROLLER_NAME_PREFIX: &str = "k8s-";

/// Tag the controller stamps with the owning cluster's name
const CONTROLLER_CLUSTER_TAG: &str = "elbv2.k8s.aws/cluster";

/// Per-resource-kind sweep counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepCounts {
    pub found: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Outcome of one full sweep, per resource kind
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepReport {
    pub load_balancers: SweepCounts,
    pub target_groups: SweepCounts,
    pub security_groups: SweepCounts,
}

impl SweepReport {
    pub fn total_found(&self) -> usize {
        self.load_balancers.found + self.target_groups.found + self.security_groups.found
    }

    pub fn total_deleted(&self) -> usize {
        self.load_balancers.deleted + self.target_groups.deleted + self.security_groups.deleted
    }

    pub fn total_failed(&self) -> usize {
        self.load_balancers.failed + self.target_groups.failed + self.security_groups.failed
    }
}

/// True when a tag set marks the resource as owned by exactly this cluster.
///
/// A resource tagged for another cluster, even one sharing the `k8s-` name
/// prefix, must never match; the tag comparison is exact, never a prefix
/// match.
pub fn is_owned_by<'a>(
    tags: impl IntoIterator<Item = (&'a str, &'a str)>,
    cluster_name: &str,
) -> bool {
    let shared_tag = format!("kubernetes.io/cluster/{}", cluster_name);
    tags.into_iter().any(|(key, value)| {
        (key == CONTROLLER_CLUSTER_TAG && value == cluster_name)
            || (key == shared_tag && value == "owned")
    })
}

/// Sweeps controller-created AWS resources tagged for one cluster
pub struct OrphanReclaimer {
    elb: aws_sdk_elasticloadbalancingv2::Client,
    ec2: aws_sdk_ec2::Client,
    cluster_name: String,
}

impl OrphanReclaimer {
    pub fn new(config: &SdkConfig, cluster_name: impl Into<String>) -> Self {
        Self {
            elb: aws_sdk_elasticloadbalancingv2::Client::new(config),
            ec2: aws_sdk_ec2::Client::new(config),
            cluster_name: cluster_name.into(),
        }
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    /// Run the full sweep. Never fails; failures show up in the report.
    pub async fn sweep(&self) -> SweepReport {
        SweepReport {
            load_balancers: self.sweep_load_balancers().await,
            target_groups: self.sweep_target_groups().await,
            security_groups: self.sweep_security_groups().await,
        }
    }

    async fn sweep_load_balancers(&self) -> SweepCounts {
        let mut counts = SweepCounts::default();

        let lbs = match self.elb.describe_load_balancers().send().await {
            Ok(output) => output.load_balancers.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("listing load balancers failed: {}", DisplayErrorContext(&e));
                return counts;
            }
        };

        for lb in lbs {
            let (Some(name), Some(arn)) = (lb.load_balancer_name(), lb.load_balancer_arn())
            else {
                continue;
            };
            if !name.starts_with(CONTROLLER_NAME_PREFIX) {
                continue;
            }
            let tags = self.elb_resource_tags(arn).await;
            if !is_owned_by(
                tags.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                &self.cluster_name,
            ) {
                continue;
            }

            counts.found += 1;
            tracing::debug!(%name, "orphaned load balancer found");

            match self.delete_load_balancer(arn).await {
                Ok(()) => counts.deleted += 1,
                Err(e) => {
                    tracing::warn!(%name, "load balancer deletion failed: {e}");
                    counts.failed += 1;
                }
            }
        }

        counts
    }

    /// Delete a load balancer, listeners first (the API rejects deleting a
    /// load balancer that still has listeners attached)
    async fn delete_load_balancer(&self, arn: &str) -> Result<(), AwsError> {
        let listeners = self
            .elb
            .describe_listeners()
            .load_balancer_arn(arn)
            .send()
            .await
            .map_err(|e| AwsError::Api(format!("{}", DisplayErrorContext(&e))))?
            .listeners
            .unwrap_or_default();

        for listener in listeners {
            if let Some(listener_arn) = listener.listener_arn() {
                self.elb
                    .delete_listener()
                    .listener_arn(listener_arn)
                    .send()
                    .await
                    .map_err(|e| AwsError::Api(format!("{}", DisplayErrorContext(&e))))?;
            }
        }

        self.elb
            .delete_load_balancer()
            .load_balancer_arn(arn)
            .send()
            .await
            .map_err(|e| AwsError::Api(format!("{}", DisplayErrorContext(&e))))?;

        Ok(())
    }

    async fn sweep_target_groups(&self) -> SweepCounts {
        let mut counts = SweepCounts::default();

        let groups = match self.elb.describe_target_groups().send().await {
            Ok(output) => output.target_groups.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("listing target groups failed: {}", DisplayErrorContext(&e));
                return counts;
            }
        };

        for group in groups {
            let (Some(name), Some(arn)) = (group.target_group_name(), group.target_group_arn())
            else {
                continue;
            };
            if !name.starts_with(CONTROLLER_NAME_PREFIX) {
                continue;
            }
            let tags = self.elb_resource_tags(arn).await;
            if !is_owned_by(
                tags.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                &self.cluster_name,
            ) {
                continue;
            }

            counts.found += 1;
            tracing::debug!(%name, "orphaned target group found");

            let result = self
                .elb
                .delete_target_group()
                .target_group_arn(arn)
                .send()
                .await;
            match result {
                Ok(_) => counts.deleted += 1,
                Err(e) => {
                    tracing::warn!(%name, "target group deletion failed: {}", DisplayErrorContext(&e));
                    counts.failed += 1;
                }
            }
        }

        counts
    }

    async fn sweep_security_groups(&self) -> SweepCounts {
        let mut counts = SweepCounts::default();

        // Security groups carry the shared-ownership tag directly, so the
        // listing itself can be scoped to the cluster.
        let filter = Filter::builder()
            .name("tag-key")
            .values(format!("kubernetes.io/cluster/{}", self.cluster_name))
            .build();

        let groups = match self
            .ec2
            .describe_security_groups()
            .filters(filter)
            .send()
            .await
        {
            Ok(output) => output.security_groups.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(
                    "listing security groups failed: {}",
                    aws_sdk_ec2::error::DisplayErrorContext(&e)
                );
                return counts;
            }
        };

        for group in groups {
            let Some(group_id) = group.group_id() else {
                continue;
            };
            // The VPC default group is undeletable and not ours to touch.
            if group.group_name() == Some("default") {
                continue;
            }

            counts.found += 1;
            tracing::debug!(%group_id, "orphaned security group found");

            let result = self
                .ec2
                .delete_security_group()
                .group_id(group_id)
                .send()
                .await;
            match result {
                Ok(_) => counts.deleted += 1,
                Err(e) => {
                    // DependencyViolation while ENIs drain is routine here;
                    // the group is reported, not reclaimed.
                    tracing::warn!(
                        %group_id,
                        "security group deletion failed: {}",
                        aws_sdk_ec2::error::DisplayErrorContext(&e)
                    );
                    counts.failed += 1;
                }
            }
        }

        counts
    }

    /// Tags of one ELBv2 resource. An unreadable tag set means the
    /// resource cannot be proven ours, so it is treated as not owned.
    async fn elb_resource_tags(&self, arn: &str) -> Vec<(String, String)> {
        let descriptions = match self.elb.describe_tags().resource_arns(arn).send().await {
            Ok(output) => output.tag_descriptions.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(%arn, "reading tags failed: {}", DisplayErrorContext(&e));
                return Vec::new();
            }
        };

        descriptions
            .into_iter()
            .flat_map(|d| d.tags.unwrap_or_default())
            .filter_map(|t| match (t.key, t.value) {
                (Some(k), Some(v)) => Some((k, v)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_tag_matches_exact_cluster() {
        let tags = [("elbv2.k8s.aws/cluster", "eks-demo-demo1-cluster")];
        assert!(is_owned_by(tags, "eks-demo-demo1-cluster"));
    }

    #[test]
    fn test_shared_ownership_tag_matches() {
        let tags = [
            ("Name", "k8s-default-app"),
            ("kubernetes.io/cluster/eks-demo-demo1-cluster", "owned"),
        ];
        assert!(is_owned_by(tags, "eks-demo-demo1-cluster"));
    }

    #[test]
    fn test_sibling_environment_is_never_matched() {
        // Two environments sharing the prefix, distinct suffixes: the
        // isolation property says demo1's sweep must not claim demo2's
        // resources.
        let demo2_tags = [("elbv2.k8s.aws/cluster", "eks-demo-demo2-cluster")];
        assert!(!is_owned_by(demo2_tags, "eks-demo-demo1-cluster"));

        let demo2_shared = [("kubernetes.io/cluster/eks-demo-demo2-cluster", "owned")];
        assert!(!is_owned_by(demo2_shared, "eks-demo-demo1-cluster"));
    }

    #[test]
    fn test_cluster_name_prefix_of_another_is_not_enough() {
        // demo1's cluster id is a prefix of demo10's; exact comparison only.
        let demo10_tags = [("elbv2.k8s.aws/cluster", "eks-demo-demo10-cluster")];
        assert!(!is_owned_by(demo10_tags, "eks-demo-demo1-cluster"));
    }

    #[test]
    fn test_shared_tag_requires_owned_value() {
        let shared = [("kubernetes.io/cluster/eks-demo-demo1-cluster", "shared")];
        assert!(!is_owned_by(shared, "eks-demo-demo1-cluster"));
    }

    #[test]
    fn test_empty_tags_never_match() {
        let no_tags: [(&str, &str); 0] = [];
        assert!(!is_owned_by(no_tags, "eks-demo-demo1-cluster"));
    }

    #[test]
    fn test_sweep_report_totals() {
        let report = SweepReport {
            load_balancers: SweepCounts {
                found: 2,
                deleted: 1,
                failed: 1,
            },
            target_groups: SweepCounts {
                found: 3,
                deleted: 3,
                failed: 0,
            },
            security_groups: SweepCounts::default(),
        };
        assert_eq!(report.total_found(), 5);
        assert_eq!(report.total_deleted(), 4);
        assert_eq!(report.total_failed(), 1);
    }
}
