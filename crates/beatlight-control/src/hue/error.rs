use thiserror::Error;

#[derive(Error, Debug)]
pub enum HueError {
    #[error("Bridge address missing")]
    MissingBridge,
    #[error("Application key missing")]
    MissingUsername,
    #[error("No lamps configured")]
    NoLamps,
    #[error("Invalid lamp id {0:?}")]
    InvalidLampId(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}
