//! Scheduling relaxations for seeds that consist of a single node.
//!
//! Anti-affinity rules and hard topology spread constraints can never be
//! satisfied on one node, so matching workloads would stay unschedulable
//! forever. Two edits apply:
//!
//! - the provider-gcp extension deployment loses its pod anti-affinity
//! - every `DoNotSchedule` topology spread constraint on a Deployment or
//!   StatefulSet is rewritten to `ScheduleAnyway`, dropping `minDomains`
//!   (which is only honored for `DoNotSchedule`)

use tracing::info;

use crate::workload::Workload;

const GCP_PROVIDER_DEPLOYMENT: &str = "gardener-extension-provider-gcp";

const DO_NOT_SCHEDULE: &str = "DoNotSchedule";
const SCHEDULE_ANYWAY: &str = "ScheduleAnyway";

/// Relax single-node scheduling obstacles. Returns whether the workload was
/// changed.
pub fn mutate(workload: &mut Workload) -> bool {
    let mut changed = false;

    if matches!(workload, Workload::Deployment(_)) && workload.name() == GCP_PROVIDER_DEPLOYMENT {
        changed |= clear_pod_anti_affinity(workload);
    }

    changed |= relax_topology_spread(workload);
    changed
}

fn clear_pod_anti_affinity(workload: &mut Workload) -> bool {
    let Some(pod_spec) = workload.pod_spec_mut() else {
        return false;
    };
    match pod_spec.affinity.as_mut() {
        Some(affinity) if affinity.pod_anti_affinity.is_some() => {
            info!("removing provider-gcp pod anti affinity rule");
            affinity.pod_anti_affinity = None;
            true
        }
        _ => false,
    }
}

fn relax_topology_spread(workload: &mut Workload) -> bool {
    let Some(pod_spec) = workload.pod_spec_mut() else {
        return false;
    };
    let Some(constraints) = pod_spec.topology_spread_constraints.as_mut() else {
        return false;
    };

    let mut changed = false;
    for constraint in constraints
        .iter_mut()
        .filter(|constraint| constraint.when_unsatisfiable == DO_NOT_SCHEDULE)
    {
        info!("patching topology do not schedule constraint for single node seed to schedule anyway");
        constraint.when_unsatisfiable = SCHEDULE_ANYWAY.to_string();
        constraint.min_domains = None;
        changed = true;
    }
    changed
}
