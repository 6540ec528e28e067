use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Composite business key of a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChassisId {
    pub series: String,
    pub number: u32,
}

impl ChassisId {
    pub fn new<S: Into<String>>(series: S, number: u32) -> Self {
        Self {
            series: series.into(),
            number,
        }
    }
}

impl fmt::Display for ChassisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.series, self.number)
    }
}

/// Kind of vehicle. Unrecognized names collapse into [`VehicleType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleType {
    Car,
    Truck,
    Bus,
    Other,
}

impl VehicleType {
    /// Returns the canonical name used on the wire and in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Car => "Car",
            Self::Truck => "Truck",
            Self::Bus => "Bus",
            Self::Other => "Other",
        }
    }

    /// Seating capacity assigned when a vehicle of this type is registered.
    pub const fn default_passengers(self) -> u32 {
        match self {
            Self::Bus => 42,
            Self::Truck => 1,
            Self::Car => 4,
            Self::Other => 0,
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for VehicleType {
    fn from(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("car") {
            Self::Car
        } else if value.eq_ignore_ascii_case("truck") {
            Self::Truck
        } else if value.eq_ignore_ascii_case("bus") {
            Self::Bus
        } else {
            Self::Other
        }
    }
}

impl Serialize for VehicleType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VehicleType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(VehicleTypeVisitor)
    }
}

/// Accepts any scalar; only recognized names map to a concrete type.
struct VehicleTypeVisitor;

impl<'de> Visitor<'de> for VehicleTypeVisitor {
    type Value = VehicleType;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a vehicle type name")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(VehicleType::from(value))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
        Ok(VehicleType::Other)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
        Ok(VehicleType::Other)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
        Ok(VehicleType::Other)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
        Ok(VehicleType::Other)
    }
}

/// A registered (or about to be registered) vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    pub chassis_id: ChassisId,
    pub vehicle_type: VehicleType,
    pub color: String,
    pub passengers_number: u32,
}

impl Vehicle {
    /// Builds a vehicle that has not gone through registration yet.
    ///
    /// `passengers_number` stays at zero until the domain service assigns it.
    pub fn new<S: Into<String>>(chassis_id: ChassisId, vehicle_type: VehicleType, color: S) -> Self {
        Self {
            chassis_id,
            vehicle_type,
            color: color.into(),
            passengers_number: 0,
        }
    }
}
