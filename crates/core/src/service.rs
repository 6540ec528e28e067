use std::sync::Arc;

use tracing::info;

use crate::error::{DomainFault, VehicleError};
use crate::gateway::{InsertOutcome, VehicleGateway};
use crate::types::{ChassisId, Vehicle};

/// Outcome of registering a vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddVehicleOutcome {
    /// The vehicle was stored with its system-assigned passenger count.
    Added(Vehicle),
    /// A vehicle with the same chassis id already exists; nothing was stored.
    DuplicateChassisId,
}

impl AddVehicleOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added(_))
    }
}

/// Enforces the vehicle business rules on top of a [`VehicleGateway`].
///
/// The service keeps no state between calls. Dropping one of its futures
/// drops the gateway call it is awaiting.
pub struct VehicleService<G> {
    gateway: Arc<G>,
}

impl<G> Clone for VehicleService<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
        }
    }
}

impl<G: VehicleGateway> VehicleService<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Registers a new vehicle unless its chassis id is already taken.
    ///
    /// The caller supplied `passengers_number` is discarded and replaced by the
    /// default for the vehicle type. The lookup and the insert are separate
    /// gateway calls; a conflict reported by the insert is treated the same
    /// way as a hit on the lookup.
    pub async fn add_vehicle(
        &self,
        mut vehicle: Vehicle,
    ) -> Result<AddVehicleOutcome, VehicleError<G::Error>> {
        if vehicle.chassis_id.series.trim().is_empty() {
            return Err(DomainFault::chassis_series_required().into());
        }
        if vehicle.color.trim().is_empty() {
            return Err(DomainFault::color_required().into());
        }

        let existing = self
            .gateway
            .find_by_chassis_id(&vehicle.chassis_id)
            .await
            .map_err(VehicleError::Gateway)?;
        if existing.is_some() {
            info!(stage = "domain", chassis_id = %vehicle.chassis_id, "duplicate chassis id rejected");
            return Ok(AddVehicleOutcome::DuplicateChassisId);
        }

        vehicle.passengers_number = vehicle.vehicle_type.default_passengers();
        let outcome = self
            .gateway
            .insert(&vehicle)
            .await
            .map_err(VehicleError::Gateway)?;

        match outcome {
            InsertOutcome::Inserted => {
                info!(
                    stage = "domain",
                    chassis_id = %vehicle.chassis_id,
                    vehicle_type = %vehicle.vehicle_type,
                    passengers = vehicle.passengers_number,
                    "vehicle registered"
                );
                Ok(AddVehicleOutcome::Added(vehicle))
            }
            InsertOutcome::Duplicate => {
                info!(stage = "domain", chassis_id = %vehicle.chassis_id, "concurrent duplicate chassis id rejected by storage");
                Ok(AddVehicleOutcome::DuplicateChassisId)
            }
        }
    }

    pub async fn vehicle_by_chassis_id(
        &self,
        chassis_id: &ChassisId,
    ) -> Result<Option<Vehicle>, VehicleError<G::Error>> {
        self.gateway
            .find_by_chassis_id(chassis_id)
            .await
            .map_err(VehicleError::Gateway)
    }

    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>, VehicleError<G::Error>> {
        self.gateway.list_all().await.map_err(VehicleError::Gateway)
    }

    /// Changes the color of an existing vehicle. Returns `false` when no vehicle matches.
    pub async fn update_color(
        &self,
        chassis_id: &ChassisId,
        new_color: &str,
    ) -> Result<bool, VehicleError<G::Error>> {
        if new_color.trim().is_empty() {
            return Err(DomainFault::color_required().into());
        }

        let updated = self
            .gateway
            .update_color(chassis_id, new_color)
            .await
            .map_err(VehicleError::Gateway)?;
        if updated {
            info!(stage = "domain", %chassis_id, color = new_color, "vehicle color updated");
        }
        Ok(updated)
    }
}
