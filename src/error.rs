use std::path::PathBuf;

use thiserror::Error;

use crate::simulation_engine::vehicles::VehicleId;

/// Everything that can go wrong while coordinating an intersection.
///
/// Apart from the config variants these are all programmer errors: once one
/// is raised, the FIFO or occupancy bookkeeping can no longer be trusted.
#[derive(Debug, Error)]
pub enum IntersectionError {
    #[error("admission gate is empty, no vehicle to release")]
    EmptyGate,

    #[error("{component} is already simulating")]
    AlreadySimulating { component: &'static str },

    #[error("vehicle {0} stopped waiting before its entry permit arrived")]
    PermitDropped(VehicleId),

    #[error("intersection shut down before vehicle {0} was admitted")]
    AdmissionClosed(VehicleId),

    #[error("failed to read config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    ConfigInvalid(String),
}

pub type Result<T> = std::result::Result<T, IntersectionError>;
