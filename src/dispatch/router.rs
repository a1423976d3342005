use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    AuthorityLevel, DeliveryResult, DispatchDecision, RawShipmentSubmission, ShipmentId,
};
use super::overrides::{OverrideError, OverrideRequest};
use super::repository::{AlertPublisher, DispatchRepository, RepositoryError};
use super::service::{DispatchService, DispatchServiceError};
use super::weather::WeatherProvider;

/// Router builder exposing the dispatch pipeline over HTTP. The caller
/// renders; the core only validates and decides.
pub fn dispatch_router<R, A, W>(service: Arc<DispatchService<R, A, W>>) -> Router
where
    R: DispatchRepository + 'static,
    A: AlertPublisher + 'static,
    W: WeatherProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/dispatch/shipments",
            post(submit_handler::<R, A, W>),
        )
        .route(
            "/api/v1/dispatch/shipments/:shipment_id",
            get(status_handler::<R, A, W>),
        )
        .route(
            "/api/v1/dispatch/shipments/:shipment_id/evaluate",
            post(evaluate_handler::<R, A, W>),
        )
        .route(
            "/api/v1/dispatch/shipments/:shipment_id/resubmit",
            post(resubmit_handler::<R, A, W>),
        )
        .route(
            "/api/v1/dispatch/shipments/:shipment_id/override",
            post(override_handler::<R, A, W>),
        )
        .route(
            "/api/v1/dispatch/shipments/:shipment_id/outcome",
            post(outcome_handler::<R, A, W>),
        )
        .route("/api/v1/dispatch/weights", get(weights_handler::<R, A, W>))
        .route(
            "/api/v1/dispatch/learning/run",
            post(learning_handler::<R, A, W>),
        )
        .with_state(service)
}

async fn submit_handler<R, A, W>(
    State(service): State<Arc<DispatchService<R, A, W>>>,
    axum::Json(submission): axum::Json<RawShipmentSubmission>,
) -> Response
where
    R: DispatchRepository + 'static,
    A: AlertPublisher + 'static,
    W: WeatherProvider + 'static,
{
    match service.submit(submission, Utc::now().date_naive()) {
        Ok(record) => {
            let payload = json!({
                "shipment_id": record.shipment.id.0,
                "status": record.status.label(),
                "address_confidence": record.shipment.address_confidence,
            });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

async fn status_handler<R, A, W>(
    State(service): State<Arc<DispatchService<R, A, W>>>,
    Path(shipment_id): Path<String>,
) -> Response
where
    R: DispatchRepository + 'static,
    A: AlertPublisher + 'static,
    W: WeatherProvider + 'static,
{
    match service.get(&ShipmentId(shipment_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn evaluate_handler<R, A, W>(
    State(service): State<Arc<DispatchService<R, A, W>>>,
    Path(shipment_id): Path<String>,
) -> Response
where
    R: DispatchRepository + 'static,
    A: AlertPublisher + 'static,
    W: WeatherProvider + 'static,
{
    let now = Utc::now();
    match service.evaluate(&ShipmentId(shipment_id), now.date_naive(), now) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn resubmit_handler<R, A, W>(
    State(service): State<Arc<DispatchService<R, A, W>>>,
    Path(shipment_id): Path<String>,
    axum::Json(submission): axum::Json<RawShipmentSubmission>,
) -> Response
where
    R: DispatchRepository + 'static,
    A: AlertPublisher + 'static,
    W: WeatherProvider + 'static,
{
    match service.resubmit(
        &ShipmentId(shipment_id),
        submission,
        Utc::now().date_naive(),
    ) {
        Ok(record) => {
            let payload = json!({
                "shipment_id": record.shipment.id.0,
                "status": record.status.label(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct OverrideBody {
    proposed: DispatchDecision,
    actor: String,
    authority: AuthorityLevel,
    reason: String,
}

async fn override_handler<R, A, W>(
    State(service): State<Arc<DispatchService<R, A, W>>>,
    Path(shipment_id): Path<String>,
    axum::Json(body): axum::Json<OverrideBody>,
) -> Response
where
    R: DispatchRepository + 'static,
    A: AlertPublisher + 'static,
    W: WeatherProvider + 'static,
{
    let request = OverrideRequest {
        shipment_id: ShipmentId(shipment_id),
        proposed: body.proposed,
        actor: body.actor,
        authority: body.authority,
        reason: body.reason,
    };
    match service.override_decision(request, Utc::now()) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct OutcomeBody {
    result: DeliveryResult,
}

async fn outcome_handler<R, A, W>(
    State(service): State<Arc<DispatchService<R, A, W>>>,
    Path(shipment_id): Path<String>,
    axum::Json(body): axum::Json<OutcomeBody>,
) -> Response
where
    R: DispatchRepository + 'static,
    A: AlertPublisher + 'static,
    W: WeatherProvider + 'static,
{
    match service.record_outcome(&ShipmentId(shipment_id), body.result, Utc::now()) {
        Ok(outcome) => (StatusCode::CREATED, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn weights_handler<R, A, W>(
    State(service): State<Arc<DispatchService<R, A, W>>>,
) -> Response
where
    R: DispatchRepository + 'static,
    A: AlertPublisher + 'static,
    W: WeatherProvider + 'static,
{
    match service.weights_view() {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn learning_handler<R, A, W>(
    State(service): State<Arc<DispatchService<R, A, W>>>,
) -> Response
where
    R: DispatchRepository + 'static,
    A: AlertPublisher + 'static,
    W: WeatherProvider + 'static,
{
    match service.run_learning_cycle(Utc::now()) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: DispatchServiceError) -> Response {
    let status = match &error {
        DispatchServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DispatchServiceError::Locked(_) => StatusCode::CONFLICT,
        DispatchServiceError::Override(OverrideError::InsufficientAuthority { .. }) => {
            StatusCode::FORBIDDEN
        }
        DispatchServiceError::Override(
            OverrideError::MissingJustification { .. } | OverrideError::NoOpOverride,
        ) => StatusCode::UNPROCESSABLE_ENTITY,
        DispatchServiceError::Override(OverrideError::Conflict) => StatusCode::CONFLICT,
        DispatchServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        DispatchServiceError::Repository(
            RepositoryError::Conflict | RepositoryError::VersionConflict { .. },
        ) => StatusCode::CONFLICT,
        DispatchServiceError::Repository(RepositoryError::Unavailable(_))
        | DispatchServiceError::Weights(_)
        | DispatchServiceError::Alert(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = match &error {
        DispatchServiceError::Validation(validation) => json!({
            "error": error.to_string(),
            "violations": validation.violations,
        }),
        _ => json!({ "error": error.to_string() }),
    };

    (status, axum::Json(payload)).into_response()
}
