use std::path::PathBuf;

/// Errors returned by the tracking frontend.
#[derive(thiserror::Error, Debug)]
pub enum FrontendError {
    #[error("invalid configuration: `{field}` {reason}")]
    InvalidConfig { field: &'static str, reason: String },
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    #[error("feature set length mismatch ({keypoints} keypoints, {descriptors} descriptors)")]
    LengthMismatch { keypoints: usize, descriptors: usize },
    #[error("failed to read config file {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FrontendError>;
