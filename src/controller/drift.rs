//! Credentials drift detection
//!
//! Read-only: compares the credentials id the Platform reports with the one
//! stored after the last update. On mismatch the credentials-bearing field is
//! overwritten with [`CREDENTIALS_DRIFT_SENTINEL`], so the declared value no
//! longer matches state and the next apply re-runs the update path.

use crate::api::types::ExternalCluster;
use crate::resource::{ClusterProvider, ClusterRegistration};
use tracing::info;

pub use crate::resource::CREDENTIALS_DRIFT_SENTINEL;

/// Returns `true` when drift was found and the sentinel written
///
/// The stored `credentials_id` is left alone; only a successful update
/// replaces it.
pub fn detect_credentials_drift(
    reg: &mut ClusterRegistration,
    observed: &ExternalCluster,
) -> bool {
    let server = observed.credentials_id.as_deref().unwrap_or_default();
    let stored = reg.credentials_id.as_deref().unwrap_or_default();

    if server != stored {
        let (field, _) = reg.credentials_field();
        info!(
            cluster_id = %observed.id,
            stored_credentials_id = stored,
            server_credentials_id = server,
            field = field,
            "Credentials drift detected"
        );
        *reg.credentials_field_mut() = Some(CREDENTIALS_DRIFT_SENTINEL.to_string());
        return true;
    }

    if let (ClusterProvider::Eks(spec), Some(eks)) = (&mut reg.provider, &observed.eks) {
        if eks.assume_role_arn.is_some() {
            spec.assume_role_arn = eks.assume_role_arn.clone();
        }
    }
    false
}
