use std::time::Duration;

use thiserror::Error;

use crate::polyline::DecodeError;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("routing provider responded {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("no route found")]
    NoRouteFound,
    #[error("routing provider did not answer within {0:?}")]
    Timeout(Duration),
    #[error("route geometry could not be decoded: {0}")]
    Decode(#[from] DecodeError),
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("a route is being saved")]
    SaveInFlight,
    #[error("a route is still being computed")]
    RecomputeInFlight,
    #[error("no optimized route found to save")]
    NoDraft,
    #[error("route request superseded by a newer reload")]
    Superseded,
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PlannerError {
    /// Failures after which the provider is considered to have no route for
    /// the request.
    pub fn is_no_route(&self) -> bool {
        matches!(self, PlannerError::NoRouteFound | PlannerError::Timeout(_))
    }

    /// Title shown to the user when this error is reported.
    pub fn title(&self) -> &'static str {
        match self {
            PlannerError::Network(_) | PlannerError::Provider { .. } => "Temporary network error",
            PlannerError::NoRouteFound | PlannerError::Timeout(_) => "No route found",
            PlannerError::Decode(_) => "Invalid route geometry",
            PlannerError::Backend { .. } => "Server error",
            PlannerError::SaveInFlight
            | PlannerError::RecomputeInFlight
            | PlannerError::NoDraft
            | PlannerError::Superseded => "Action not available",
            PlannerError::Config(_) => "Configuration error",
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
