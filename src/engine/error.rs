use thiserror::Error;

use crate::gateway::GatewayError;
use crate::model::{ErrorKind, ErrorMarker, UnitId};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("limit exceeded: {0}")]
    LimitExceeded(&'static str),
    #[error("rental unit not found: {0}")]
    NotFound(UnitId),
    #[error("contract store failed for unit {unit_id}: {message}")]
    Service { unit_id: UnitId, message: String },
    #[error("cancelled before unit {0} was resolved")]
    Cancelled(UnitId),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) | EngineError::LimitExceeded(_) => ErrorKind::Validation,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::Service { .. } => ErrorKind::Service,
            EngineError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    pub fn unit_id(&self) -> Option<&str> {
        match self {
            EngineError::NotFound(id) | EngineError::Cancelled(id) => Some(id),
            EngineError::Service { unit_id, .. } => Some(unit_id),
            EngineError::Validation(_) | EngineError::LimitExceeded(_) => None,
        }
    }

    /// Unknown units map to `NotFound`; every other gateway fault is a `Service` error.
    pub(crate) fn from_gateway(unit_id: &str, err: GatewayError) -> Self {
        match err {
            GatewayError::UnknownUnit(id) => EngineError::NotFound(id),
            other => EngineError::Service {
                unit_id: unit_id.to_string(),
                message: other.to_string(),
            },
        }
    }

    pub fn to_marker(&self, unit_id: &str) -> ErrorMarker {
        ErrorMarker {
            kind: self.kind(),
            unit_id: unit_id.to_string(),
            message: self.to_string(),
        }
    }
}
