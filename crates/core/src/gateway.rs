use async_trait::async_trait;

use crate::types::{ChassisId, Vehicle};

/// Storage collaborator owning durable vehicle state.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait VehicleGateway: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Point lookup by chassis id. `Ok(None)` when nothing matches.
    async fn find_by_chassis_id(
        &self,
        chassis_id: &ChassisId,
    ) -> Result<Option<Vehicle>, Self::Error>;

    /// Persists a new vehicle row.
    ///
    /// A storage-level uniqueness conflict on the chassis id is reported as
    /// [`InsertOutcome::Duplicate`], not as an error.
    async fn insert(&self, vehicle: &Vehicle) -> Result<InsertOutcome, Self::Error>;

    /// Returns every stored vehicle in storage order.
    async fn list_all(&self) -> Result<Vec<Vehicle>, Self::Error>;

    /// Changes the color of the matching vehicle. Returns `true` iff a row matched.
    async fn update_color(
        &self,
        chassis_id: &ChassisId,
        color: &str,
    ) -> Result<bool, Self::Error>;
}

/// Result of attempting to insert a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

impl InsertOutcome {
    pub fn is_duplicate(self) -> bool {
        matches!(self, Self::Duplicate)
    }
}
