//! Liveness and capability fixes for the garden nginx ingress controller.
//!
//! The ingress controller deployed into the `garden` namespace needs a much
//! longer liveness grace period than its chart ships with, and the chroot
//! image variant requires the `SYS_CHROOT` capability to start at all.

use k8s_openapi::api::core::v1::Container;
use tracing::{debug, info};

use crate::workload::Workload;

const DEPLOYMENT_NAME: &str = "nginx-ingress-controller";
const NAMESPACE: &str = "garden";
const CONTAINER_NAME: &str = "nginx-ingress-controller";

const LIVENESS_INITIAL_DELAY_SECONDS: i32 = 600;
const CHROOT_IMAGE_MARKER: &str = "/ingress-nginx/controller-chroot:";
const SYS_CHROOT_CAPABILITY: &str = "SYS_CHROOT";

/// Patch the ingress controller's containers. Returns whether the workload
/// was changed.
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

    let mut changed = false;
    for container in pod_spec
        .containers
        .iter_mut()
        .filter(|container| container.name == CONTAINER_NAME)
    {
        changed |= bump_liveness_delay(container);
        changed |= add_chroot_capability(container);
    }
    changed
}

fn bump_liveness_delay(container: &mut Container) -> bool {
    match container.liveness_probe.as_mut() {
        Some(probe) if probe.initial_delay_seconds != Some(LIVENESS_INITIAL_DELAY_SECONDS) => {
            info!("patching nginx-ingress-controller liveness probe");
            probe.initial_delay_seconds = Some(LIVENESS_INITIAL_DELAY_SECONDS);
            true
        }
        Some(_) => false,
        None => {
            debug!("container has no liveness probe, skipping");
            false
        }
    }
}

fn add_chroot_capability(container: &mut Container) -> bool {
    let is_chroot_image = container
        .image
        .as_deref()
        .is_some_and(|image| image.contains(CHROOT_IMAGE_MARKER));
    if !is_chroot_image {
        return false;
    }

    let Some(add) = container
        .security_context
        .as_mut()
        .and_then(|security_context| security_context.capabilities.as_mut())
        .and_then(|capabilities| capabilities.add.as_mut())
    else {
        debug!("chroot image without a capability add list, skipping");
        return false;
    };

    if add.iter().any(|capability| capability == SYS_CHROOT_CAPABILITY) {
        return false;
    }

    info!("patching nginx-ingress-controller with chroot image missing SYS_CHROOT capability");
    add.push(SYS_CHROOT_CAPABILITY.to_string());
    true
}
