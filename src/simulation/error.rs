use std::path::PathBuf;

use thiserror::Error;

/// All failures the energy core reports to its host. Running out of charge is not an error, it is
/// reported through [`crate::simulation::vehicles::EnergyResult::insufficient_charge`].
#[derive(Debug, Error)]
pub enum EnergyError {
    #[error("invalid traversal input: {0}")]
    InvalidTraversalInput(String),

    #[error("invalid charging record: {0}")]
    InvalidChargingRecord(String),

    #[error("invalid parking query: arrival time {arrival_time}s, duration {duration}s")]
    InvalidParkingQuery { arrival_time: f64, duration: f64 },

    #[error("vehicle {0} has no battery and can't be charged")]
    NotChargeable(String),

    #[error("vehicle type {0} is not known to the garage")]
    UnknownVehicleType(String),

    #[error("vehicle type {0} already exists")]
    DuplicateVehicleType(String),

    #[error("vehicle {0} is not parked in the garage")]
    VehicleNotInGarage(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse config at {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, EnergyError>;
