use thiserror::Error;

use crate::core::types::CharacterId;

/// Faults the engine cannot resolve on its own.
///
/// Expected gameplay outcomes (a morale roll that cannot be attempted, a
/// wound box that is not available) are reported through the refusal enums
/// of their own modules, never through this type.
#[derive(Error, Debug)]
pub enum RulesError {
    #[error("Invalid modifier mode code: {0}")]
    InvalidModifierMode(i64),

    #[error("Unknown wound target: {0}")]
    UnknownWoundTarget(String),

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Character not found: {0}")]
    CharacterNotFound(CharacterId),
}

pub type Result<T> = std::result::Result<T, RulesError>;
