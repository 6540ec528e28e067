use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use tracing::warn;
use vehicle_registry_core::VehicleService;
use vehicle_registry_storage::{Database, VehicleRepository};

use crate::facade::VehicleFacade;
use crate::{telemetry, vehicles};

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    storage: Database,
    vehicles: VehicleFacade<VehicleRepository>,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, storage: Database) -> Self {
        let service = VehicleService::new(Arc::new(storage.vehicles()));
        Self {
            metrics,
            storage,
            vehicles: VehicleFacade::new(service),
        }
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn storage(&self) -> &Database {
        &self.storage
    }

    pub fn vehicles(&self) -> &VehicleFacade<VehicleRepository> {
        &self.vehicles
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/health", get(health))
        .route("/api/infra", get(infra))
        .route("/metrics", get(metrics))
        .merge(vehicles::routes())
        .nest("/v1", vehicles::routes())
        .route_layer(middleware::from_fn(telemetry::track_requests))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.storage().ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "healthy"}))),
        Err(err) => {
            warn!(stage = "health", error = %err, "database ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unhealthy"})),
            )
        }
    }
}

async fn infra() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> Response {
    let body = telemetry::render_metrics(state.metrics());
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}
