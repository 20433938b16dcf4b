//! Terraform CLI adapter for Unmoor
//!
//! Wraps the `terraform` binary for the three operations teardown needs:
//! backend init, workspace selection, and (targeted) destroy. Success and
//! failure are decided by exit status; the only output parsing is the
//! classifier for the S3/DynamoDB state-consistency quirk, which lives in
//! [`classify`] so the fragile text match stays out of the control flow.
//!
//! # Requirements
//!
//! - `terraform` must be installed and on PATH
//! - Backend credentials are Terraform's own concern; this crate never
//!   touches them

pub mod classify;
pub mod error;
pub mod terraform;

pub use classify::{InitOutcome, is_state_checksum_mismatch};
pub use error::{Result, TerraformError};
pub use terraform::Terraform;
