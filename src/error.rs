//! Errors surfaced at the planner boundary.

use serde::Serialize;
use thiserror::Error;

use crate::registry::StopCode;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("invalid coordinate (lon {lon}, lat {lat})")]
    InvalidCoordinate { lon: f64, lat: f64 },
    #[error("invalid stop code {0:?}")]
    InvalidStopCode(String),
    #[error("stop {0} is registered more than once")]
    DuplicateStop(StopCode),
    #[error(
        "cannot split into two non-empty vehicles: {valid} valid stop(s), at least {min} required"
    )]
    TooFewStops { valid: usize, min: usize },
    #[error("too many stops: {count} valid stop(s), at most {max} supported")]
    TooManyStops { count: usize, max: usize },
    #[error("registry config: {0}")]
    Config(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PlanError>;

impl PlanError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Renders the error in the `{ "error": "..." }` shape consumed by the UI layer.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            error: self.to_string(),
        }
    }
}

/// Serializable error marker returned in place of an optimization result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub error: String,
}
