//! Frame sources feeding the tracker

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::{debug, warn};

use crate::error::{Result, RunError};

/// File extensions accepted by [`ImageDirectorySource`]
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Supplies frames in sequence
pub trait FrameSource {
    /// Next frame, or `Ok(None)` once the sequence is exhausted
    fn next_frame(&mut self) -> Result<Option<DynamicImage>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        (**self).next_frame()
    }
}

/// Frames read from the image files of a directory, in file name order
///
/// Extract a video with e.g. `ffmpeg -i video.mp4 frames/%06d.png` first.
#[derive(Debug)]
pub struct ImageDirectorySource {
    paths: Vec<PathBuf>,
    cursor: usize,
}

impl ImageDirectorySource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let list_err = |source| RunError::ListFrames {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(list_err)? {
            let path = entry.map_err(list_err)?.path();
            if !path.is_file() {
                continue;
            }
            if is_image_file(&path) {
                paths.push(path);
            } else {
                warn!("skipping non-image file {}", path.display());
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(RunError::NoFrames(dir.to_path_buf()));
        }
        debug!("found {} frames in {}", paths.len(), dir.display());

        Ok(Self { paths, cursor: 0 })
    }

    /// Total number of frames
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for ImageDirectorySource {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        let Some(path) = self.paths.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;

        // Channel layout is passed through as decoded; the tracker rejects non-RGB frames
        let img = image::open(path).map_err(|source| RunError::Decode {
            path: path.clone(),
            source,
        })?;
        Ok(Some(img))
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Frames held in memory, for tests and synthetic sequences
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<DynamicImage>,
}

impl MemorySource {
    pub fn new(frames: impl IntoIterator<Item = DynamicImage>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        Ok(self.frames.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_directory_frames_sorted_as_decoded() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(8, 6, Rgb([10, 20, 30]))
            .save(dir.path().join("0001.png"))
            .unwrap();
        RgbaImage::from_pixel(8, 6, Rgba([1, 2, 3, 255]))
            .save(dir.path().join("0002.png"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageDirectorySource::open(dir.path()).unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(source.paths()[0].file_name().unwrap(), "0001.png");

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.color(), image::ColorType::Rgb8);
        assert_eq!(first.to_rgb8().get_pixel(0, 0), &Rgb([10, 20, 30]));

        // Alpha is not dropped here, so the tracker can refuse the frame
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.color(), image::ColorType::Rgba8);

        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ImageDirectorySource::open(dir.path()),
            Err(RunError::NoFrames(_))
        ));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ImageDirectorySource::open(dir.path().join("nope")),
            Err(RunError::ListFrames { .. })
        ));
    }

    #[test]
    fn test_corrupt_frame_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("0001.png"), b"definitely not a png").unwrap();
        let mut source = ImageDirectorySource::open(dir.path()).unwrap();
        assert!(matches!(
            source.next_frame(),
            Err(RunError::Decode { .. })
        ));
    }

    #[test]
    fn test_extension_filter() {
        assert!(is_image_file(Path::new("a/0001.PNG")));
        assert!(is_image_file(Path::new("frame.jpeg")));
        assert!(!is_image_file(Path::new("frame.mp4")));
        assert!(!is_image_file(Path::new("README")));
    }

    #[test]
    fn test_memory_source_drains_in_order() {
        let frames = (0..3u8)
            .map(|v| DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([v, v, v]))));
        let mut source = MemorySource::new(frames);
        assert_eq!(source.remaining(), 3);
        for v in 0..3u8 {
            let frame = source.next_frame().unwrap().unwrap();
            assert_eq!(frame.to_rgb8().get_pixel(0, 0), &Rgb([v, v, v]));
        }
        assert!(source.next_frame().unwrap().is_none());
    }
}
