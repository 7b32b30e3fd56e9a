//! Error taxonomy for scene construction and degraded runtime paths.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or running the scene.
///
/// Only configuration errors are returned from constructors. The runtime
/// variants (`AssetLoad`, `EnvironmentMapUnavailable`) are logged by the
/// component that owns the failing resource and then degraded locally.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("invalid configuration for `{field}`: {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },

    #[error("scene has no vessels")]
    EmptyRoster,

    #[error("vessel id {0} is used more than once")]
    DuplicateVesselId(u32),

    #[error("vessel index {index} out of range (fleet has {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("failed to load model `{model}`: {reason}")]
    AssetLoad { model: String, reason: String },

    #[error("environment map unavailable: {0}")]
    EnvironmentMapUnavailable(String),

    #[error("failed to read scene file {path:?}: {source}")]
    SceneFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scene file: {0}")]
    SceneFileParse(#[from] ron::error::SpannedError),

    #[error("graphics error: {0}")]
    Graphics(String),
}

impl SceneError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SceneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_configuration_message_names_field() {
        let err = SceneError::invalid("persistence", "must be in (0, 1), got 1.5");
        let msg = err.to_string();
        assert!(msg.contains("persistence"));
        assert!(msg.contains("1.5"));
    }
}
