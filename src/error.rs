//! Error types for descriptors, settings schemas and plugin lifecycle.

use thiserror::Error;

/// A settings schema that cannot be turned into a panel or a defaults map.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("setting at {position} has no id")]
    MissingId { position: String },

    #[error("setting '{id}' has no type")]
    MissingKind { id: String },

    #[error("duplicate setting id '{id}' in {scope}")]
    DuplicateId { scope: String, id: String },

    #[error("category '{id}' is nested inside category '{parent}'")]
    NestedCategory { parent: String, id: String },

    #[error("slider '{id}' is missing min/max bounds")]
    MissingSliderBounds { id: String },

    #[error("{kind} '{id}' has no options")]
    MissingOptions { kind: String, id: String },
}

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("invalid settings schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("invalid plugin descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("failed to parse plugin descriptor: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read plugin descriptor: {0}")]
    Io(#[from] std::io::Error),

    #[error("plugin '{0}' has no settings schema")]
    NoSettingsSchema(String),
}

pub type PluginResult<T> = Result<T, PluginError>;
