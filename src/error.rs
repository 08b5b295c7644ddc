use thiserror::Error;

/// Errors raised while loading or validating configuration data
/// (presets, locations, scene-setup files). An operation that returns
/// one of these has made no partial state change.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown preset: {0}")]
    PresetNotFound(String),
    #[error("unknown location: {0}")]
    LocationNotFound(String),
    #[error("group {group}: habitat list is empty")]
    EmptyHabitatList { group: String },
    #[error("group {group}: no bounds volumes for habitats {habitats:?}")]
    EmptyBoundsList { group: String, habitats: Vec<String> },
    #[error("group already exists: {0}")]
    DuplicateGroup(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced to control-API callers when enqueueing commands.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("view index {0} out of range (views are 0..4)")]
    ViewIndexOutOfRange(usize),
    #[error("view count {0} out of range (1..=4)")]
    ViewCountOutOfRange(usize),
    #[error("fraction {0} out of range (0..=1)")]
    FractionOutOfRange(f32),
    #[error("turbidity {0} out of range (-1..=1)")]
    TurbidityOutOfRange(f32),
    #[error("command queue has been closed")]
    QueueClosed,
}
