//! Debug markers drawn on the display copy of a frame

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};

use crate::descriptor::FeatureSet;
use crate::matcher::Match;
use crate::KeyPoint;

pub const KEYPOINT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const KEYPOINT_RADIUS: i32 = 2;
pub const MATCH_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Draw a small circle at every keypoint
pub fn draw_keypoints(canvas: &mut RgbImage, keypoints: &[KeyPoint]) {
    for kp in keypoints {
        let center = (kp.x.round() as i32, kp.y.round() as i32);
        draw_hollow_circle_mut(canvas, center, KEYPOINT_RADIUS, KEYPOINT_COLOR);
    }
}

/// Draw a segment from each matched current keypoint to where its partner
/// was in the previous frame
pub fn draw_matches(
    canvas: &mut RgbImage,
    current: &FeatureSet,
    previous: &FeatureSet,
    matches: &[Match],
) {
    for m in matches {
        let (Some(cur), Some(prev)) = (
            current.keypoints().get(m.current_idx),
            previous.keypoints().get(m.previous_idx),
        ) else {
            continue;
        };
        draw_line_segment_mut(canvas, (cur.x, cur.y), (prev.x, prev.y), MATCH_COLOR);
    }
}
