//! Ordered teardown stages
//!
//! A teardown run is a fixed list of [`Stage`]s executed strictly in order.
//! The order is a correctness requirement: resources spanning two control
//! planes (Kubernetes objects and the AWS objects their controllers manage)
//! deadlock when the owning side is destroyed before the dependent side has
//! had a chance to reconcile.
//!
//! Each stage carries its own [`Criticality`]. A `Critical` failure aborts
//! the run immediately; a `BestEffort` failure becomes a recorded warning
//! and the run moves on, which is what keeps re-runs against an already
//! torn-down environment safe.

use crate::error::{CoreError, Result};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;

/// Whether a stage failure aborts the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    /// Failure aborts the remainder of the run
    Critical,
    /// Failure is logged as a warning and the run continues
    BestEffort,
}

impl std::fmt::Display for Criticality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Criticality::Critical => write!(f, "critical"),
            Criticality::BestEffort => write!(f, "best-effort"),
        }
    }
}

/// Successful stage outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// The stage destroyed something
    Done,
    /// Everything the stage targets was already gone
    AlreadyAbsent,
}

type StageOp = Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<StageStatus>> + Send>;

/// One ordered unit of teardown work
pub struct Stage {
    label: String,
    criticality: Criticality,
    op: StageOp,
}

impl Stage {
    pub fn new<F, Fut>(label: impl Into<String>, criticality: Criticality, op: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<StageStatus>> + Send + 'static,
    {
        Self {
            label: label.into(),
            criticality,
            op: Box::new(move || op().boxed()),
        }
    }

    /// A stage whose failure aborts the run
    pub fn critical<F, Fut>(label: impl Into<String>, op: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<StageStatus>> + Send + 'static,
    {
        Self::new(label, Criticality::Critical, op)
    }

    /// A stage whose failure is tolerated (the target may already be gone)
    pub fn best_effort<F, Fut>(label: impl Into<String>, op: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<StageStatus>> + Send + 'static,
    {
        Self::new(label, Criticality::BestEffort, op)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn criticality(&self) -> Criticality {
        self.criticality
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("label", &self.label)
            .field("criticality", &self.criticality)
            .finish_non_exhaustive()
    }
}

/// Receives progress events from the driver
///
/// The binary installs a console implementation; tests install a recording
/// one, which is what makes stage order and criticality testable without
/// touching any cloud API.
pub trait Reporter {
    fn stage_started(&mut self, index: usize, total: usize, label: &str);
    fn stage_completed(&mut self, index: usize, label: &str, status: StageStatus);
    fn stage_failed(
        &mut self,
        index: usize,
        label: &str,
        criticality: Criticality,
        message: &str,
    );
}

/// A tolerated best-effort failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageWarning {
    pub label: String,
    pub message: String,
}

/// Aggregate outcome of one teardown run
#[derive(Debug, Clone, Default)]
pub struct TeardownReport {
    /// Number of stages in the plan
    pub total: usize,
    /// Stages that finished successfully
    pub completed: usize,
    /// Best-effort failures that were tolerated
    pub warnings: Vec<StageWarning>,
}

impl TeardownReport {
    /// True when every stage succeeded outright
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Execute the stages strictly in order.
///
/// Stops at the first `Critical` failure and returns
/// [`CoreError::StageFailed`] without invoking any later stage. `BestEffort`
/// failures are converted into warnings on the returned report.
pub async fn run_teardown(
    stages: Vec<Stage>,
    reporter: &mut dyn Reporter,
) -> Result<TeardownReport> {
    let total = stages.len();
    let mut report = TeardownReport {
        total,
        ..Default::default()
    };

    for (i, stage) in stages.into_iter().enumerate() {
        let index = i + 1;
        reporter.stage_started(index, total, &stage.label);
        tracing::debug!(stage = %stage.label, index, total, "stage started");

        match (stage.op)().await {
            Ok(status) => {
                reporter.stage_completed(index, &stage.label, status);
                report.completed += 1;
            }
            Err(e) => {
                let message = format!("{:#}", e);
                reporter.stage_failed(index, &stage.label, stage.criticality, &message);
                match stage.criticality {
                    Criticality::Critical => {
                        return Err(CoreError::StageFailed {
                            label: stage.label,
                            message,
                        });
                    }
                    Criticality::BestEffort => {
                        tracing::warn!(stage = %stage.label, %message, "stage failed, continuing");
                        report.warnings.push(StageWarning {
                            label: stage.label,
                            message,
                        });
                    }
                }
            }
        }
    }

    Ok(report)
}
