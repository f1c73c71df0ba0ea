//! Presentation of tracked frames
//!
//! A renderer receives every processed frame once and reports whether the
//! user asked to stop.

use std::path::Path;

use glimpse_frontend::TrackedFrame;
use log::info;
use rerun as rr;

use crate::error::Result;

/// Shows tracked frames
pub trait Renderer {
    /// Present one frame. Returns `true` when the run should stop after it.
    fn present(&mut self, frame: &TrackedFrame) -> Result<bool>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn present(&mut self, frame: &TrackedFrame) -> Result<bool> {
        (**self).present(frame)
    }
}

/// Renderer that shows nothing, optionally asking to quit after a number of frames
#[derive(Debug, Default, Clone)]
pub struct NullRenderer {
    presented: usize,
    quit_after: Option<usize>,
}

impl NullRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request quit once `frames` frames have been presented
    pub fn quit_after(frames: usize) -> Self {
        Self {
            presented: 0,
            quit_after: Some(frames),
        }
    }

    pub fn presented(&self) -> usize {
        self.presented
    }
}

impl Renderer for NullRenderer {
    fn present(&mut self, _frame: &TrackedFrame) -> Result<bool> {
        self.presented += 1;
        Ok(self.quit_after.is_some_and(|limit| self.presented >= limit))
    }
}

/// Logs frames, keypoints and matches to a Rerun recording
pub struct RerunRenderer {
    rec: rr::RecordingStream,
}

impl RerunRenderer {
    /// Spawn a Rerun viewer and stream to it
    pub fn spawn(app_id: &str) -> Result<Self> {
        let rec = rr::RecordingStreamBuilder::new(app_id).spawn()?;
        info!("Rerun viewer spawned");
        Ok(Self { rec })
    }

    /// Write the recording to an `.rrd` file
    pub fn save(app_id: &str, path: impl AsRef<Path>) -> Result<Self> {
        let rec = rr::RecordingStreamBuilder::new(app_id).save(path.as_ref())?;
        info!("recording to {}", path.as_ref().display());
        Ok(Self { rec })
    }

    pub fn from_stream(rec: rr::RecordingStream) -> Self {
        Self { rec }
    }

    fn log_frame(&self, frame: &TrackedFrame) -> Result<()> {
        let (width, height) = frame.display.dimensions();
        self.rec.set_time_sequence("frame", frame.index as i64);

        self.rec.log(
            "frame/image",
            &rr::Image::from_rgb24(frame.display.as_raw().clone(), [width, height]),
        )?;

        let positions: Vec<[f32; 2]> = frame
            .features
            .keypoints()
            .iter()
            .map(|kp| [kp.x, kp.y])
            .collect();
        let num_points = positions.len();
        self.rec.log(
            "frame/image/keypoints",
            &rr::Points2D::new(positions)
                .with_colors(vec![[0u8, 255, 0]; num_points])
                .with_radii(vec![2.0; num_points]),
        )?;

        // Always log, so a frame without matches clears the previous segments
        let strips: Vec<Vec<[f32; 2]>> = frame
            .match_segments()
            .into_iter()
            .map(|(cur, prev)| vec![cur, prev])
            .collect();
        self.rec.log(
            "frame/image/matches",
            &rr::LineStrips2D::new(strips)
                .with_colors(vec![[255u8, 0, 0]])
                .with_radii(vec![1.0]),
        )?;

        self.rec.log(
            "stats/keypoints",
            &rr::Scalars::new([frame.features.len() as f64]),
        )?;
        self.rec.log(
            "stats/matches",
            &rr::Scalars::new([frame.matches.len() as f64]),
        )?;

        Ok(())
    }
}

impl Renderer for RerunRenderer {
    fn present(&mut self, frame: &TrackedFrame) -> Result<bool> {
        self.log_frame(frame)?;
        // The viewer has no way to ask the producer to stop
        Ok(false)
    }
}

#[cfg(feature = "window")]
pub use window::WindowRenderer;

#[cfg(feature = "window")]
mod window {
    use glimpse_frontend::TrackedFrame;
    use minifb::{Key, Window, WindowOptions};

    use super::Renderer;
    use crate::error::{Result, RunError};

    /// Native window showing the annotated frame; closes on Escape
    pub struct WindowRenderer {
        window: Window,
        buffer: Vec<u32>,
        width: usize,
        height: usize,
    }

    impl WindowRenderer {
        pub fn new(title: &str, width: u32, height: u32) -> Result<Self> {
            let (width, height) = (width as usize, height as usize);
            let mut window = Window::new(title, width, height, WindowOptions::default())
                .map_err(|e| RunError::Render(e.to_string()))?;
            // Presenting must not throttle frame acquisition
            window.set_target_fps(0);
            Ok(Self {
                window,
                buffer: vec![0; width * height],
                width,
                height,
            })
        }
    }

    impl Renderer for WindowRenderer {
        fn present(&mut self, frame: &TrackedFrame) -> Result<bool> {
            if !self.window.is_open() {
                return Ok(true);
            }
            let (w, h) = frame.display.dimensions();
            if (w as usize, h as usize) != (self.width, self.height) {
                return Err(RunError::Render(format!(
                    "frame is {}x{}, window is {}x{}",
                    w, h, self.width, self.height
                )));
            }
            for (dst, px) in self.buffer.iter_mut().zip(frame.display.pixels()) {
                let [r, g, b] = px.0;
                *dst = (r as u32) << 16 | (g as u32) << 8 | b as u32;
            }
            self.window
                .update_with_buffer(&self.buffer, self.width, self.height)
                .map_err(|e| RunError::Render(e.to_string()))?;

            Ok(!self.window.is_open() || self.window.is_key_down(Key::Escape))
        }
    }
}
