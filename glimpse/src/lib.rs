//! Glimpse: run the feature tracking frontend over a frame sequence
//!
//! Frames come from a [`FrameSource`], go through a
//! [`glimpse_frontend::FeatureTracker`] and are shown by a [`Renderer`].

pub mod driver;
pub mod error;
pub mod render;
pub mod source;

// Re-export key types
pub use driver::{run, RunSummary};
pub use error::{Result, RunError};
#[cfg(feature = "window")]
pub use render::WindowRenderer;
pub use render::{NullRenderer, Renderer, RerunRenderer};
pub use source::{FrameSource, ImageDirectorySource, MemorySource};
