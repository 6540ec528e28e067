use thiserror::Error;

/// Business-rule violation carrying a stable code and a human readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct DomainFault {
    code: &'static str,
    message: String,
}

impl DomainFault {
    pub fn new<S: Into<String>>(code: &'static str, message: S) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn chassis_series_required() -> Self {
        Self::new("CHASSIS_SERIES_REQUIRED", "Chassis series must not be empty")
    }

    pub fn color_required() -> Self {
        Self::new("VEHICLE_COLOR_REQUIRED", "Vehicle color must not be empty")
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors surfaced by the vehicle domain service.
#[derive(Debug, Error)]
pub enum VehicleError<E> {
    #[error(transparent)]
    Rule(#[from] DomainFault),
    #[error("persistence gateway failure: {0}")]
    Gateway(#[source] E),
}
