use thiserror::Error;

/// Problems with caller input, detected before any upstream request is made.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("coordinate components must be finite numbers")]
    NonFinite,

    #[error("invalid coordinate '{0}': expected LAT,LON (e.g. 52.52,13.40)")]
    MalformedCoordinate(String),

    #[error("invalid planned departure '{0}': expected an ISO 8601 timestamp or \"leave now\"")]
    InvalidDeparture(String),
}

/// Failure of a whole recommendation request.
#[derive(Debug, Error)]
pub enum AdviceError {
    #[error(transparent)]
    Input(#[from] InputError),

    /// Upstream fetch failed (network, timeout, non-success status, bad payload).
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl AdviceError {
    pub fn is_input(&self) -> bool {
        matches!(self, AdviceError::Input(_))
    }
}
