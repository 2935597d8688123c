use thiserror::Error;

use crate::city::persistence::PersistenceError;
use crate::core::types::{BuildingId, CitizenId, EventId};

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Unknown building: {0}")]
    UnknownBuilding(BuildingId),

    #[error("Unknown citizen: {0}")]
    UnknownCitizen(CitizenId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{building} already hosts live event {existing}")]
    EventConflict {
        building: BuildingId,
        existing: EventId,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
