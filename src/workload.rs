//! Typed view over the workload kinds this webhook mutates.
//!
//! Admission requests arrive as untyped [`DynamicObject`]s; the handler only
//! ever lifts Deployments and StatefulSets into a [`Workload`]. Every other
//! kind stays untyped and passes through the webhook unchanged.

use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::PodSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::{DynamicObject, GroupVersionKind};

/// A workload object owned by a single admission request.
///
/// Both variants embed a pod template, which is where every mutation rule
/// operates. The boxes keep the enum small relative to the large generated
/// API types.
#[derive(Clone, Debug, PartialEq)]
pub enum Workload {
    Deployment(Box<Deployment>),
    StatefulSet(Box<StatefulSet>),
}

impl Workload {
    /// Lift the request object into a typed workload.
    ///
    /// Returns `Ok(None)` for kinds this webhook does not handle, and an
    /// error only when an object of a handled kind fails to decode.
    pub fn from_admission(
        kind: &GroupVersionKind,
        object: &DynamicObject,
    ) -> Result<Option<Self>, serde_json::Error> {
        match (kind.group.as_str(), kind.kind.as_str()) {
            ("apps", "Deployment") => {
                let value = serde_json::to_value(object)?;
                Ok(Some(Self::Deployment(Box::new(serde_json::from_value(
                    value,
                )?))))
            }
            ("apps", "StatefulSet") => {
                let value = serde_json::to_value(object)?;
                Ok(Some(Self::StatefulSet(Box::new(serde_json::from_value(
                    value,
                )?))))
            }
            _ => Ok(None),
        }
    }

    fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::Deployment(deployment) => &deployment.metadata,
            Self::StatefulSet(statefulset) => &statefulset.metadata,
        }
    }

    /// The Kubernetes kind of the wrapped object.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Deployment(_) => "Deployment",
            Self::StatefulSet(_) => "StatefulSet",
        }
    }

    /// The object name, or an empty string when unset.
    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    /// The object namespace, or an empty string when unset.
    pub fn namespace(&self) -> &str {
        self.metadata().namespace.as_deref().unwrap_or_default()
    }

    /// Mutable access to the pod spec inside the workload's pod template.
    ///
    /// Returns `None` when the object carries no spec or template spec, so
    /// rules degrade to a no-op on partially specified objects.
    pub fn pod_spec_mut(&mut self) -> Option<&mut PodSpec> {
        match self {
            Self::Deployment(deployment) => deployment
                .spec
                .as_mut()
                .and_then(|spec| spec.template.spec.as_mut()),
            Self::StatefulSet(statefulset) => statefulset
                .spec
                .as_mut()
                .and_then(|spec| spec.template.spec.as_mut()),
        }
    }

    /// Serialize the workload back to JSON for patch computation.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Deployment(deployment) => serde_json::to_value(deployment),
            Self::StatefulSet(statefulset) => serde_json::to_value(statefulset),
        }
    }
}

impl From<Deployment> for Workload {
    fn from(deployment: Deployment) -> Self {
        Self::Deployment(Box::new(deployment))
    }
}

impl From<StatefulSet> for Workload {
    fn from(statefulset: StatefulSet) -> Self {
        Self::StatefulSet(Box::new(statefulset))
    }
}
