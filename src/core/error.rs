use thiserror::Error;

use crate::core::types::EntityId;
use crate::spatial::grid::GridCoord;

#[derive(Error, Debug)]
pub enum SkirmishError {
    #[error("No path found from {from:?} to {to:?}")]
    NoPathFound { from: GridCoord, to: GridCoord },

    #[error("Entity not found: {0:?}")]
    EntityNotFound(EntityId),

    #[error("Invalid tactics configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SkirmishError>;
