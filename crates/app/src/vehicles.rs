use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use metrics::counter;
use tracing::info;

use crate::facade::{ChassisIdPayload, CreateVehicleRequest, UpdateColorRequest, VehicleResponse};
use crate::problem::ProblemResponse;
use crate::router::AppState;

/// Vehicle endpoints, mounted both at the root and under the `/v1` prefix.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route("/vehicles/by-chassis", get(vehicle_by_chassis))
        .route("/vehicles/color", patch(update_color))
}

async fn list_vehicles(
    State(state): State<AppState>,
) -> Result<Json<Vec<VehicleResponse>>, ProblemResponse> {
    let vehicles = state.vehicles().list_vehicles().await?;
    Ok(Json(vehicles))
}

async fn create_vehicle(
    State(state): State<AppState>,
    payload: Result<Json<CreateVehicleRequest>, JsonRejection>,
) -> Result<Json<VehicleResponse>, ProblemResponse> {
    let Json(request) = payload?;
    let vehicle_type = request.vehicle_type;

    match state.vehicles().add_vehicle(request).await? {
        Some(created) => {
            counter!("vehicles_created_total", "type" => vehicle_type.as_str()).increment(1);
            Ok(Json(created))
        }
        None => {
            counter!("vehicles_rejected_total", "reason" => "duplicate_chassis_id").increment(1);
            Err(ProblemResponse::new(
                StatusCode::BAD_REQUEST,
                "duplicate_chassis_id",
                "Vehicle could not be added. Vehicle with the same chassis ID already exists.",
            ))
        }
    }
}

async fn vehicle_by_chassis(
    State(state): State<AppState>,
    query: Result<Query<ChassisIdPayload>, QueryRejection>,
) -> Result<Json<VehicleResponse>, ProblemResponse> {
    let Query(chassis_id) = query?;

    state
        .vehicles()
        .vehicle_by_chassis_id(chassis_id)
        .await?
        .map(Json)
        .ok_or_else(vehicle_not_found)
}

async fn update_color(
    State(state): State<AppState>,
    payload: Result<Json<UpdateColorRequest>, JsonRejection>,
) -> Result<StatusCode, ProblemResponse> {
    let Json(request) = payload?;
    let chassis_series = request.chassis_id.series.clone();
    let chassis_number = request.chassis_id.number;

    if state.vehicles().update_color(request).await? {
        counter!("vehicle_color_updates_total", "result" => "updated").increment(1);
        Ok(StatusCode::NO_CONTENT)
    } else {
        counter!("vehicle_color_updates_total", "result" => "not_found").increment(1);
        info!(stage = "api", %chassis_series, chassis_number, "color update for unknown vehicle");
        Err(vehicle_not_found())
    }
}

fn vehicle_not_found() -> ProblemResponse {
    ProblemResponse::new(
        StatusCode::NOT_FOUND,
        "vehicle_not_found",
        "No vehicle matches the provided chassis identifier.",
    )
}
