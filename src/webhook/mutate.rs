//! Mutating admission handler for Deployments and StatefulSets.
//!
//! This handler:
//! 1. Extracts the admission request from the review envelope
//! 2. Lifts Deployment/StatefulSet objects into a typed [`Workload`]
//! 3. Evaluates the enabled mutations against the object
//! 4. Responds with a JSON patch when a rule fired, a plain allow otherwise
//!
//! Any kind the webhook does not handle is allowed unchanged without ever
//! touching the mutation engine; a request is only answered with
//! `allowed: false` when an object of a handled kind cannot be decoded.

use std::sync::Arc;

use axum::{extract::State, Json};
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use kube::core::DynamicObject;
use tracing::{debug, error, info, info_span};

use crate::mutations::{self, MutationOutcome};
use crate::webhook::server::WebhookState;
use crate::workload::Workload;

/// Mutating admission webhook handler
pub async fn mutate_handler(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "failed to extract admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    Json(admit(&state, &request).into_review())
}

/// Process a single admission request
pub fn admit(state: &WebhookState, request: &AdmissionRequest<DynamicObject>) -> AdmissionResponse {
    let uid = &request.uid;

    // Nothing to mutate on DELETE
    if request.operation == Operation::Delete {
        debug!(uid = %uid, "admission request allowed (DELETE)");
        return AdmissionResponse::from(request);
    }

    let Some(object) = &request.object else {
        debug!(uid = %uid, "no object in request, allowing unchanged");
        return AdmissionResponse::from(request);
    };

    let workload = match Workload::from_admission(&request.kind, object) {
        Ok(Some(workload)) => workload,
        Ok(None) => {
            debug!(uid = %uid, kind = %request.kind.kind, "kind not handled, allowing unchanged");
            return AdmissionResponse::from(request);
        }
        Err(e) => {
            error!(uid = %uid, kind = %request.kind.kind, error = %e, "failed to decode object");
            return AdmissionResponse::from(request)
                .deny(format!("failed to decode {}: {}", request.kind.kind, e));
        }
    };

    state.health.metrics.record_request(workload.kind());

    let span = info_span!(
        "mutate",
        namespace = %workload.namespace(),
        name = %workload.name(),
        kind = %workload.kind(),
    );
    let _guard = span.enter();

    match mutations::apply_all(&workload, &state.enabled) {
        MutationOutcome::NoChange => {
            debug!(uid = %uid, "no mutation applied");
            AdmissionResponse::from(request)
        }
        MutationOutcome::Mutated(mutated) => patch_response(state, request, &workload, &mutated),
    }
}

/// Build the allow-with-patch response for a mutated workload.
///
/// The patch is the difference between the typed object before and after the
/// mutations ran. Both sides are serialized the same way, so the diff
/// contains exactly the rule edits and nothing else.
fn patch_response(
    state: &WebhookState,
    request: &AdmissionRequest<DynamicObject>,
    original: &Workload,
    mutated: &Workload,
) -> AdmissionResponse {
    let patch = match diff(original, mutated) {
        Ok(patch) => patch,
        Err(e) => {
            error!(error = %e, "failed to compute patch");
            return AdmissionResponse::from(request)
                .deny(format!("failed to compute patch: {e}"));
        }
    };

    info!(patch_ops = patch.0.len(), "mutated workload");

    match AdmissionResponse::from(request).with_patch(patch) {
        Ok(response) => {
            state.health.metrics.record_patched(original.kind());
            response
        }
        Err(e) => {
            error!(error = %e, "failed to serialize patch");
            AdmissionResponse::from(request).deny(format!("patch serialization error: {e}"))
        }
    }
}

fn diff(original: &Workload, mutated: &Workload) -> Result<json_patch::Patch, serde_json::Error> {
    Ok(json_patch::diff(&original.to_value()?, &mutated.to_value()?))
}
