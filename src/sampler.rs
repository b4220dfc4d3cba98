//! # Color Sampler Module
//!
//! Averages the colour of a small square window of a frame, used to report the colour under the
//! center of the camera view.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use nalgebra::Point2;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::pipeline::FrameProcessor;
use crate::readout::ColorReadout;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Radius of the sample window used when none is configured.
pub const DEFAULT_RADIUS: i64 = 2;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Inclusive rectangle of pixels to average, always inside the frame it was built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleWindow {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32
}

/// Mean of the red, green and blue channels over a [`SampleWindow`], each in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AveragedColor {
    pub r: f32,
    pub g: f32,
    pub b: f32
}

/// Parameters of the colour sampler.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SamplerParams {
    /// Half the side of the sample window, the sign is ignored
    pub radius: i64,

    /// Point to sample at, `None` samples at the center of each frame
    pub center: Option<[i64; 2]>
}

/// Frame processor producing a [`ColorReadout`] of the colour at the sample point.
#[derive(Clone, Debug, Default)]
pub struct ColorSampler {
    params: SamplerParams
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl SampleWindow {
    /// Build the window of radius `|n|` around `center`, clamped to the frame.
    ///
    /// The upper bounds are clamped to the last valid row and column, so a window touching the
    /// right or bottom edge never reaches past the frame. Returns [`Error::EmptyWindow`] if the
    /// clamped window holds no pixel, which happens when the frame is empty or the center lies
    /// further than `|n|` outside of it.
    pub fn new(frame: &Frame, center: Point2<i64>, n: i64) -> Result<Self> {
        if frame.is_empty() {
            return Err(Error::EmptyWindow);
        }

        let s = n.saturating_abs();
        let last_x = frame.width() as i64 - 1;
        let last_y = frame.height() as i64 - 1;

        let min_x = center.x.saturating_sub(s).max(0);
        let min_y = center.y.saturating_sub(s).max(0);
        let max_x = center.x.saturating_add(s).min(last_x);
        let max_y = center.y.saturating_add(s).min(last_y);

        if max_x < min_x || max_y < min_y {
            return Err(Error::EmptyWindow);
        }

        Ok(Self {
            min_x: min_x as u32,
            min_y: min_y as u32,
            max_x: max_x as u32,
            max_y: max_y as u32
        })
    }

    /// Number of pixels covered by the window.
    pub fn len(&self) -> u64 {
        (self.max_x - self.min_x + 1) as u64 * (self.max_y - self.min_y + 1) as u64
    }
}

impl AveragedColor {
    /// Channel-wise complement, always readable against `self`.
    pub fn complement(&self) -> Self {
        Self {
            r: 1.0 - self.r,
            g: 1.0 - self.g,
            b: 1.0 - self.b
        }
    }
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            center: None
        }
    }
}

impl ColorSampler {
    pub fn new(params: SamplerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SamplerParams {
        &self.params
    }

    /// The point sampled in `frame`.
    pub fn center_for(&self, frame: &Frame) -> Point2<i64> {
        match self.params.center {
            Some([x, y]) => Point2::new(x, y),
            None => frame_center(frame)
        }
    }
}

impl FrameProcessor for ColorSampler {
    type Output = ColorReadout;

    fn process(&self, frame: &Frame) -> Result<Self::Output> {
        let color = average_color(frame, self.center_for(frame), self.params.radius)?;

        Ok(ColorReadout::from(color))
    }
}

// -----------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Average the red, green and blue channels of `frame` over the window of radius `|n|` around
/// `center`.
///
/// Alpha is ignored.
pub fn average_color(frame: &Frame, center: Point2<i64>, n: i64) -> Result<AveragedColor> {
    let window = SampleWindow::new(frame, center, n)?;

    let mut sum = [0f64; 3];
    for y in window.min_y..=window.max_y {
        for x in window.min_x..=window.max_x {
            let p = frame.pixel(x, y);
            sum[0] += p[0] as f64;
            sum[1] += p[1] as f64;
            sum[2] += p[2] as f64;
        }
    }

    let count = window.len() as f64;

    Ok(AveragedColor {
        r: (sum[0] / count) as f32,
        g: (sum[1] / count) as f32,
        b: (sum[2] / count) as f32
    })
}

/// Center pixel of a frame, rounding down.
pub fn frame_center(frame: &Frame) -> Point2<i64> {
    Point2::new((frame.width() / 2) as i64, (frame.height() / 2) as i64)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;
    use image::{Rgba, Rgba32FImage};

    /// Frame where the red channel encodes x and the green channel encodes y
    fn gradient(width: u32, height: u32) -> Frame {
        Frame::new(Rgba32FImage::from_fn(width, height, |x, y| {
            Rgba([x as f32 / 10.0, y as f32 / 10.0, 0.25, 1.0])
        }))
    }

    /// Test that a zero radius returns the center pixel untouched
    #[test]
    fn test_zero_radius() {
        let frame = gradient(7, 5);
        let c = average_color(&frame, Point2::new(3, 1), 0).unwrap();

        assert_eq!(c, AveragedColor { r: 0.3, g: 0.1, b: 0.25 });
    }

    /// Test that a solid frame averages to its own colour wherever it is sampled
    #[test]
    fn test_solid_frame() {
        let frame = Frame::solid(6, 4, [0.2, 0.7, 0.9, 0.3]);
        let expected = AveragedColor { r: 0.2, g: 0.7, b: 0.9 };

        for &(x, y, n) in &[(0, 0, 3), (5, 3, 1), (2, 2, 10), (-1, 7, 4), (3, 1, -2)] {
            assert_eq!(average_color(&frame, Point2::new(x, y), n).unwrap(), expected);
        }
    }

    /// Test the mid-grey 5x5 frame sampled over its whole area
    #[test]
    fn test_mid_grey() {
        let frame = Frame::solid(5, 5, [0.5, 0.5, 0.5, 1.0]);
        let c = average_color(&frame, Point2::new(2, 2), 2).unwrap();

        assert_eq!(c, AveragedColor { r: 0.5, g: 0.5, b: 0.5 });
    }

    /// Test that the window stops at the last row and column
    #[test]
    fn test_window_clamped_at_edge() {
        let frame = gradient(5, 5);
        let w = SampleWindow::new(&frame, Point2::new(4, 3), 1).unwrap();

        assert_eq!(w, SampleWindow { min_x: 3, min_y: 2, max_x: 4, max_y: 4 });
        assert_eq!(w.len(), 6);

        let c = average_color(&frame, Point2::new(4, 3), 1).unwrap();
        assert!((c.r - 0.35).abs() < 1e-6);
        assert!((c.g - 0.3).abs() < 1e-6);
    }

    /// Test that the sign of the radius is ignored
    #[test]
    fn test_negative_radius() {
        let frame = gradient(9, 9);

        assert_eq!(
            SampleWindow::new(&frame, Point2::new(4, 4), -2).unwrap(),
            SampleWindow::new(&frame, Point2::new(4, 4), 2).unwrap()
        );
    }

    /// Test that a window outside the frame, or an empty frame, is rejected
    #[test]
    fn test_empty_window() {
        let frame = gradient(4, 4);

        match average_color(&frame, Point2::new(-5, 1), 2) {
            Err(Error::EmptyWindow) => (),
            other => panic!("Unexpected result {:?}", other)
        }
        match average_color(&frame, Point2::new(1, 7), 2) {
            Err(Error::EmptyWindow) => (),
            other => panic!("Unexpected result {:?}", other)
        }

        let empty = Frame::solid(0, 3, [1.0; 4]);
        match average_color(&empty, Point2::new(0, 0), 2) {
            Err(Error::EmptyWindow) => (),
            other => panic!("Unexpected result {:?}", other)
        }
    }

    /// Test that results stay in `[0, 1]` across many windows
    #[test]
    fn test_channels_in_range() {
        let frame = Frame::new(Rgba32FImage::from_fn(8, 8, |x, y| {
            Rgba([(x * y % 7) as f32 / 6.0, 1.0, 0.0, 0.5])
        }));

        for y in -2..10 {
            for x in -2..10 {
                if let Ok(c) = average_color(&frame, Point2::new(x, y), 3) {
                    for v in &[c.r, c.g, c.b] {
                        assert!(*v >= 0.0 && *v <= 1.0);
                    }
                }
            }
        }
    }

    /// Test that the sampler uses the frame center unless configured otherwise
    #[test]
    fn test_sampler_center() {
        let frame = gradient(7, 4);

        let sampler = ColorSampler::default();
        assert_eq!(sampler.center_for(&frame), Point2::new(3, 2));

        let sampler = ColorSampler::new(SamplerParams { radius: 0, center: Some([1, 1]) });
        let readout = sampler.process(&frame).unwrap();
        assert_eq!(readout.color, AveragedColor { r: 0.1, g: 0.1, b: 0.25 });
    }
}
