//! Pod security context override for the gardenlet deployment.

use k8s_openapi::api::core::v1::PodSecurityContext;
use tracing::info;

use crate::workload::Workload;

const DEPLOYMENT_NAME: &str = "gardenlet";
const NAMESPACE: &str = "garden";

/// The gardenlet writes kubeconfigs into a shared volume; the nobody group
/// must own them for the sidecars to read.
const FS_GROUP: i64 = 65534;

/// Replace the gardenlet's pod security context. Returns whether the
/// workload was changed.
pub fn mutate(workload: &mut Workload) -> bool {
    if !matches!(workload, Workload::Deployment(_))
        || workload.name() != DEPLOYMENT_NAME
        || workload.namespace() != NAMESPACE
    {
        return false;
    }

    let Some(pod_spec) = workload.pod_spec_mut() else {
        return false;
    };

    let desired = PodSecurityContext {
        fs_group: Some(FS_GROUP),
        ..Default::default()
    };
    if pod_spec.security_context.as_ref() == Some(&desired) {
        return false;
    }

    info!("patching gardenlet pod security context");
    pod_spec.security_context = Some(desired);
    true
}
