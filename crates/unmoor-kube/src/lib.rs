//! kubectl adapter for Unmoor
//!
//! Wraps the kubectl operations teardown needs before the authoritative
//! destroy pass: deleting the load-balancer controller's admission webhook
//! and stripping finalizers from Ingress objects so their deletion cannot
//! hang on a controller that is already gone.
//!
//! # Requirements
//!
//! - `kubectl` must be installed and its current context must point at the
//!   target cluster

pub mod error;
pub mod kubectl;

pub use error::{KubeError, Result};
pub use kubectl::{DeleteOutcome, IngressRef, Kubectl, is_not_found};
