//! Error types for vit-core.

use std::path::PathBuf;

/// Result type alias using vit-core Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when configuring or constructing a ViT classifier.
///
/// Forward evaluation is not covered here: it reports `candle_core::Error`
/// directly so shape mismatches reach the caller as the tensor library
/// produced them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to read config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse YAML.
    #[error("failed to parse YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    /// Invalid construction-time configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Tensor allocation failed while building parameters.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),
}
