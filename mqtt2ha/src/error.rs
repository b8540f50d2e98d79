use thiserror::Error;

/// Errors raised while turning a JSON payload into sensor configurations.
#[derive(Debug, Error)]
pub enum Error {
    /// A value template needs at least one key to index into the payload.
    #[error("key path is empty, cannot build a value template for it")]
    EmptyKeyPath,

    /// The payload decoded fine but its root is not a JSON object.
    #[error("payload root is a scalar, expected a JSON object")]
    ScalarRoot,

    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("could not serialize YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
