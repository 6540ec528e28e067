//! Vehicle registry domain model and service.
//!
//! The crate owns the business rules (duplicate chassis detection and the
//! passenger default table) and the contract the storage layer implements.
pub mod error;
pub mod gateway;
pub mod service;
pub mod types;

pub use error::{DomainFault, VehicleError};
pub use gateway::{InsertOutcome, VehicleGateway};
pub use service::{AddVehicleOutcome, VehicleService};
pub use types::{ChassisId, Vehicle, VehicleType};
