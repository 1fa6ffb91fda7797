//! AdmissionReview contract tests.
//!
//! These build real `admission.k8s.io/v1` envelopes, run them through the
//! admission handler, and apply any emitted JSON patch back to the submitted
//! object — the same round trip the API server performs.

use std::sync::Arc;

use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use kube::core::DynamicObject;
use serde_json::json;

use seed_mutator::health::HealthState;
use seed_mutator::mutations::{EnabledMutations, Mutation};
use seed_mutator::webhook::{mutate::admit, WebhookState};

fn state(enabled: EnabledMutations) -> WebhookState {
    WebhookState::new(enabled, Arc::new(HealthState::new()))
}

fn admission_request(
    group: &str,
    kind: &str,
    resource: &str,
    object: serde_json::Value,
) -> AdmissionRequest<DynamicObject> {
    let review: AdmissionReview<DynamicObject> = serde_json::from_value(json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": "8c1b5b39-6393-11e8-b7cc-42010a800002",
            "kind": {"group": group, "version": "v1", "kind": kind},
            "resource": {"group": group, "version": "v1", "resource": resource},
            "name": object["metadata"]["name"],
            "namespace": object["metadata"]["namespace"],
            "operation": "CREATE",
            "userInfo": {"username": "system:serviceaccount:garden:gardener"},
            "object": object,
            "dryRun": false,
        }
    }))
    .unwrap();
    review.try_into().unwrap()
}

/// Apply the response's JSON patch to the submitted object.
fn apply_patch(response: &AdmissionResponse, object: serde_json::Value) -> serde_json::Value {
    let patch: json_patch::Patch =
        serde_json::from_slice(response.patch.as_deref().expect("expected a patch")).unwrap();
    let mut patched = object;
    json_patch::patch(&mut patched, &patch).unwrap();
    patched
}

fn ingress_deployment(initial_delay_seconds: i32, add: serde_json::Value) -> serde_json::Value {
    json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {"name": "nginx-ingress-controller", "namespace": "garden"},
        "spec": {
            "selector": {"matchLabels": {"app": "nginx-ingress"}},
            "template": {
                "metadata": {"labels": {"app": "nginx-ingress"}},
                "spec": {
                    "containers": [{
                        "name": "nginx-ingress-controller",
                        "image": "registry.k8s.io/ingress-nginx/controller-chroot:v1.2",
                        "livenessProbe": {"initialDelaySeconds": initial_delay_seconds},
                        "securityContext": {"capabilities": {"add": add}}
                    }]
                }
            }
        }
    })
}

#[test]
fn test_nginx_ingress_patch_round_trip() {
    let state = state(EnabledMutations::from_iter([
        Mutation::NginxIngressController,
    ]));
    let object = ingress_deployment(10, json!([]));
    let request = admission_request("apps", "Deployment", "deployments", object.clone());

    let response = admit(&state, &request);
    assert!(response.allowed);

    let patched = apply_patch(&response, object);
    let container = &patched["spec"]["template"]["spec"]["containers"][0];
    assert_eq!(container["livenessProbe"]["initialDelaySeconds"], json!(600));
    assert_eq!(
        container["securityContext"]["capabilities"]["add"],
        json!(["SYS_CHROOT"])
    );
}

#[test]
fn test_already_mutated_object_yields_no_patch() {
    let state = state(EnabledMutations::from_iter([
        Mutation::NginxIngressController,
    ]));
    let object = ingress_deployment(600, json!(["SYS_CHROOT"]));
    let request = admission_request("apps", "Deployment", "deployments", object);

    let response = admit(&state, &request);
    assert!(response.allowed);
    assert!(
        response.patch.is_none(),
        "re-submitted object must not be double-patched"
    );
}

#[test]
fn test_single_node_seed_composition_round_trip() {
    let state = state(EnabledMutations::from_iter([Mutation::SingleNodeSeed]));
    let object = json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {"name": "gardener-extension-provider-gcp", "namespace": "shoot--prod--gcp"},
        "spec": {
            "selector": {"matchLabels": {"app": "provider-gcp"}},
            "template": {
                "metadata": {"labels": {"app": "provider-gcp"}},
                "spec": {
                    "containers": [{"name": "provider-gcp", "image": "provider-gcp:v1"}],
                    "affinity": {
                        "podAntiAffinity": {
                            "requiredDuringSchedulingIgnoredDuringExecution": [{
                                "labelSelector": {"matchLabels": {"app": "provider-gcp"}},
                                "topologyKey": "kubernetes.io/hostname"
                            }]
                        }
                    },
                    "topologySpreadConstraints": [{
                        "maxSkew": 1,
                        "topologyKey": "topology.kubernetes.io/zone",
                        "whenUnsatisfiable": "DoNotSchedule",
                        "minDomains": 3
                    }]
                }
            }
        }
    });
    let request = admission_request("apps", "Deployment", "deployments", object.clone());

    let response = admit(&state, &request);
    assert!(response.allowed);

    let patched = apply_patch(&response, object);
    let spec = &patched["spec"]["template"]["spec"];
    assert_eq!(spec["affinity"]["podAntiAffinity"], json!(null));
    assert_eq!(
        spec["topologySpreadConstraints"][0]["whenUnsatisfiable"],
        json!("ScheduleAnyway")
    );
    assert_eq!(spec["topologySpreadConstraints"][0]["minDomains"], json!(null));
}

#[test]
fn test_statefulset_round_trip() {
    let state = state(EnabledMutations::from_iter([Mutation::SingleNodeSeed]));
    let object = json!({
        "apiVersion": "apps/v1",
        "kind": "StatefulSet",
        "metadata": {"name": "etcd-main", "namespace": "garden"},
        "spec": {
            "selector": {"matchLabels": {"app": "etcd"}},
            "serviceName": "etcd-main",
            "template": {
                "metadata": {"labels": {"app": "etcd"}},
                "spec": {
                    "containers": [{"name": "etcd", "image": "etcd:v3"}],
                    "topologySpreadConstraints": [{
                        "maxSkew": 1,
                        "topologyKey": "kubernetes.io/hostname",
                        "whenUnsatisfiable": "DoNotSchedule"
                    }]
                }
            }
        }
    });
    let request = admission_request("apps", "StatefulSet", "statefulsets", object.clone());

    let response = admit(&state, &request);
    assert!(response.allowed);

    let patched = apply_patch(&response, object);
    assert_eq!(
        patched["spec"]["template"]["spec"]["topologySpreadConstraints"][0]["whenUnsatisfiable"],
        json!("ScheduleAnyway")
    );
}

#[test]
fn test_unhandled_kind_passes_through() {
    let state = state(EnabledMutations::from_iter(Mutation::ALL));
    let object = json!({
        "apiVersion": "apps/v1",
        "kind": "DaemonSet",
        "metadata": {"name": "node-exporter", "namespace": "garden"},
        "spec": {
            "selector": {"matchLabels": {"app": "node-exporter"}},
            "template": {
                "metadata": {"labels": {"app": "node-exporter"}},
                "spec": {"containers": [{"name": "node-exporter", "image": "node-exporter:v1"}]}
            }
        }
    });
    let request = admission_request("apps", "DaemonSet", "daemonsets", object);

    let response = admit(&state, &request);
    assert!(response.allowed);
    assert!(response.patch.is_none());
}

#[test]
fn test_patch_type_is_json_patch() {
    let state = state(EnabledMutations::from_iter([Mutation::Gardenlet]));
    let object = json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {"name": "gardenlet", "namespace": "garden"},
        "spec": {
            "selector": {"matchLabels": {"app": "gardenlet"}},
            "template": {
                "metadata": {"labels": {"app": "gardenlet"}},
                "spec": {"containers": [{"name": "gardenlet", "image": "gardenlet:v1"}]}
            }
        }
    });
    let request = admission_request("apps", "Deployment", "deployments", object);

    let response = admit(&state, &request);
    let review = serde_json::to_value(response.into_review()).unwrap();
    assert_eq!(review["response"]["allowed"], json!(true));
    assert_eq!(review["response"]["patchType"], json!("JSONPatch"));
    assert_eq!(
        review["response"]["uid"],
        json!("8c1b5b39-6393-11e8-b7cc-42010a800002")
    );
}
