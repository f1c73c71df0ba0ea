use std::path::PathBuf;

use glimpse_frontend::FrontendError;

/// Errors that end a tracking run
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Frontend(#[from] FrontendError),
    #[error("failed to list frames in {path}")]
    ListFrames {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no image frames found in {0}")]
    NoFrames(PathBuf),
    #[error("failed to decode frame {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Recording(#[from] rerun::RecordingStreamError),
    #[error("renderer failed: {0}")]
    Render(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RunError>;
