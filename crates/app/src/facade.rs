use serde::{Deserialize, Serialize};

use vehicle_registry_core::{
    AddVehicleOutcome, ChassisId, Vehicle, VehicleError, VehicleGateway, VehicleService,
    VehicleType,
};

/// Chassis identifier as it appears in request bodies and query strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChassisIdPayload {
    pub series: String,
    pub number: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    pub chassis_id: ChassisIdPayload,
    pub vehicle_type: VehicleType,
    pub color: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateColorRequest {
    pub chassis_id: ChassisIdPayload,
    pub new_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    pub chassis_id: ChassisIdPayload,
    pub vehicle_type: VehicleType,
    pub color: String,
    pub passengers_number: u32,
}

impl From<ChassisIdPayload> for ChassisId {
    fn from(value: ChassisIdPayload) -> Self {
        ChassisId::new(value.series, value.number)
    }
}

impl From<ChassisId> for ChassisIdPayload {
    fn from(value: ChassisId) -> Self {
        Self {
            series: value.series,
            number: value.number,
        }
    }
}

impl From<CreateVehicleRequest> for Vehicle {
    fn from(value: CreateVehicleRequest) -> Self {
        Vehicle::new(value.chassis_id.into(), value.vehicle_type, value.color)
    }
}

impl From<Vehicle> for VehicleResponse {
    fn from(value: Vehicle) -> Self {
        Self {
            chassis_id: value.chassis_id.into(),
            vehicle_type: value.vehicle_type,
            color: value.color,
            passengers_number: value.passengers_number,
        }
    }
}

/// Application layer translating HTTP shapes to and from the domain service.
///
/// Mapping only: input is never rejected here.
pub struct VehicleFacade<G> {
    service: VehicleService<G>,
}

impl<G> Clone for VehicleFacade<G> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<G: VehicleGateway> VehicleFacade<G> {
    pub fn new(service: VehicleService<G>) -> Self {
        Self { service }
    }

    /// Returns the stored vehicle, or `None` when the chassis id is already taken.
    pub async fn add_vehicle(
        &self,
        request: CreateVehicleRequest,
    ) -> Result<Option<VehicleResponse>, VehicleError<G::Error>> {
        let outcome = self.service.add_vehicle(request.into()).await?;
        Ok(match outcome {
            AddVehicleOutcome::Added(vehicle) => Some(vehicle.into()),
            AddVehicleOutcome::DuplicateChassisId => None,
        })
    }

    pub async fn vehicle_by_chassis_id(
        &self,
        chassis_id: ChassisIdPayload,
    ) -> Result<Option<VehicleResponse>, VehicleError<G::Error>> {
        let vehicle = self
            .service
            .vehicle_by_chassis_id(&chassis_id.into())
            .await?;
        Ok(vehicle.map(VehicleResponse::from))
    }

    pub async fn list_vehicles(&self) -> Result<Vec<VehicleResponse>, VehicleError<G::Error>> {
        let vehicles = self.service.list_vehicles().await?;
        Ok(vehicles.into_iter().map(VehicleResponse::from).collect())
    }

    pub async fn update_color(
        &self,
        request: UpdateColorRequest,
    ) -> Result<bool, VehicleError<G::Error>> {
        let chassis_id: ChassisId = request.chassis_id.into();
        self.service
            .update_color(&chassis_id, &request.new_color)
            .await
    }
}
