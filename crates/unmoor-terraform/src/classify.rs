//! Classification of terraform init failures
//!
//! The S3 backend with DynamoDB locking occasionally rejects a state
//! refresh right after a previous update because the stored digest has not
//! caught up yet. Terraform reports this as a hard init error even though
//! waiting out the replication (or simply proceeding to destroy, which
//! re-reads state) is safe. Terraform exposes no machine-readable code for
//! it, so this module owns the one substring match in the codebase; if a
//! structured signal ever appears upstream, only this file changes.

/// Outcome of a `terraform init` run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// init succeeded
    Clean,
    /// init tripped the known S3/DynamoDB consistency mismatch; the run
    /// may proceed
    StateChecksumMismatch,
}

const CHECKSUM_MISMATCH_MARKERS: &[&str] = &[
    "state data in S3 does not have the expected content",
    "Digest value stored in the DynamoDB table",
];

/// True when the init error output matches the known benign consistency
/// mismatch. Anything else is a fatal backend error.
pub fn is_state_checksum_mismatch(output: &str) -> bool {
    CHECKSUM_MISMATCH_MARKERS
        .iter()
        .any(|marker| output.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_the_s3_content_error() {
        let stderr = "\
Error: Error inspecting states in the \"s3\" backend:
    state data in S3 does not have the expected content.

This may be caused by unusually long delays in S3 processing a previous state
update. Please wait for a minute or two and try again.";
        assert!(is_state_checksum_mismatch(stderr));
    }

    #[test]
    fn test_matches_the_dynamodb_digest_hint() {
        let stderr = "you may need to manually verify the remote state and \
update the Digest value stored in the DynamoDB table to the following value: abc123";
        assert!(is_state_checksum_mismatch(stderr));
    }

    #[test]
    fn test_other_init_errors_are_not_benign() {
        assert!(!is_state_checksum_mismatch(
            "Error: error configuring S3 Backend: no valid credential sources found"
        ));
        assert!(!is_state_checksum_mismatch(
            "Error: Failed to get existing workspaces: AccessDenied"
        ));
        assert!(!is_state_checksum_mismatch(""));
    }
}
