//! Readiness probe removal for the gardener-resource-manager deployment.
//!
//! On resource-constrained seeds the resource manager flaps in and out of
//! readiness and takes its webhooks with it; dropping the probe keeps the
//! endpoints stable.

use tracing::{debug, info};

use crate::workload::Workload;

const DEPLOYMENT_NAME: &str = "gardener-resource-manager";
const NAMESPACE: &str = "garden";

/// Clear the readiness probe on the first container. Returns whether the
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
    let Some(container) = pod_spec.containers.first_mut() else {
        debug!("deployment has no containers, skipping");
        return false;
    };

    if container.readiness_probe.take().is_some() {
        info!("patching gardener-resource-manager readiness probe");
        true
    } else {
        false
    }
}
