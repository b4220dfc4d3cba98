//! # Threshold Filter Module
//!
//! Binarises frames on a weighted luma value, producing a two-tone black and white frame.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::pipeline::FrameProcessor;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Level chosen offline with Otsu's method for the reference camera.
pub const DEFAULT_LEVEL: f32 = 0.554688;

/// Output value of pixels below the level.
pub const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Output value of pixels at or above the level.
pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Weights of the red, green and blue channels, in that order, in the intensity sum.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct LumaWeights(pub [f32; 3]);

/// Parameters of the threshold filter.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThresholdParams {
    /// Intensity at and above which a pixel becomes white
    pub level: f32,

    pub weights: LumaWeights
}

/// Frame processor producing a thresholded copy of each frame.
#[derive(Clone, Debug, Default)]
pub struct ThresholdFilter {
    params: ThresholdParams
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl LumaWeights {
    /// The weights of the reference camera kernel, `0.114` on red and `0.299` on blue.
    pub const CAMERA: LumaWeights = LumaWeights([0.114, 0.587, 0.299]);

    /// ITU-R BT.601 luma weights.
    pub const REC601: LumaWeights = LumaWeights([0.299, 0.587, 0.114]);

    /// Weighted sum of the red, green and blue channels of `pixel`.
    pub fn intensity(&self, pixel: [f32; 4]) -> f32 {
        let [wr, wg, wb] = self.0;

        wr * pixel[0] + wg * pixel[1] + wb * pixel[2]
    }
}

impl Default for LumaWeights {
    fn default() -> Self {
        Self::CAMERA
    }
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            weights: LumaWeights::default()
        }
    }
}

impl ThresholdFilter {
    pub fn new(params: ThresholdParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ThresholdParams {
        &self.params
    }

    /// Threshold `input`, or fail with [`Error::FilterUnavailable`] if there is none.
    pub fn output_image(&self, input: Option<&Frame>) -> Result<Frame> {
        let frame = input.ok_or(Error::FilterUnavailable)?;

        Ok(threshold(frame, self.params.level, self.params.weights))
    }
}

impl FrameProcessor for ThresholdFilter {
    type Output = Frame;

    fn process(&self, frame: &Frame) -> Result<Self::Output> {
        match self.output_image(Some(frame)) {
            Ok(f) => Ok(f),
            Err(e) => {
                log::debug!("Threshold filter failed ({}), passing frame through", e);
                Ok(frame.clone())
            }
        }
    }
}

// -----------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Map every pixel of `frame` to [`WHITE`] if its intensity is at least `level`, or to [`BLACK`]
/// otherwise.
///
/// Input alpha is discarded, every output pixel is opaque.
pub fn threshold(frame: &Frame, level: f32, weights: LumaWeights) -> Frame {
    frame.map_pixels(|p| {
        if weights.intensity(p) < level {
            BLACK
        } else {
            WHITE
        }
    })
}

/// Pick a threshold level for `frame` with Otsu's method over a 256 bin intensity histogram.
///
/// Meant for choosing [`ThresholdParams::level`] offline from a representative frame, the
/// pipeline never calls it. Bin `t` holds the intensities rounding to `t / 255`, the returned
/// level is the upper edge of the last dark bin, so [`threshold`] puts every pixel on the side
/// of the split its bin was counted on.
pub fn otsu_level(frame: &Frame, weights: LumaWeights) -> f32 {
    let mut hist = [0u64; 256];
    for p in frame.pixels() {
        let bin = (weights.intensity(p) * 255.0).round().max(0.0).min(255.0) as usize;
        hist[bin] += 1;
    }

    let total: u64 = hist.iter().sum();
    if total == 0 {
        return DEFAULT_LEVEL;
    }

    let sum_total: f64 = hist.iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 0usize;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b == 0.0 {
            continue;
        }
        let w_f = total as f64 - w_b;
        if w_f == 0.0 {
            break;
        }

        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t;
        }
    }

    // Bins up to best_t are the dark class
    (best_t as f32 + 0.5) / 255.0
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;
    use image::{Rgba, Rgba32FImage};

    fn noise(width: u32, height: u32) -> Frame {
        Frame::new(Rgba32FImage::from_fn(width, height, |x, y| {
            let v = ((x * 31 + y * 17) % 101) as f32 / 100.0;
            Rgba([v, 1.0 - v, (v * 3.0) % 1.0, v])
        }))
    }

    fn is_two_tone(frame: &Frame) -> bool {
        frame.pixels().all(|p| p == BLACK || p == WHITE)
    }

    /// Test that a mid-grey frame falls below the default level
    #[test]
    fn test_mid_grey_is_black() {
        let frame = Frame::solid(5, 5, [0.5, 0.5, 0.5, 1.0]);
        let out = threshold(&frame, DEFAULT_LEVEL, LumaWeights::default());

        assert_eq!(out, Frame::solid(5, 5, BLACK));
    }

    /// Test that an intensity equal to the level maps to white
    #[test]
    fn test_level_is_inclusive() {
        let pixel = [0.3, 0.8, 0.6, 0.0];
        let weights = LumaWeights::default();
        let frame = Frame::solid(3, 2, pixel);

        let out = threshold(&frame, weights.intensity(pixel), weights);

        assert_eq!(out, Frame::solid(3, 2, WHITE));
    }

    /// Test that the weights are applied to red, green and blue in order
    #[test]
    fn test_weights_positional() {
        let red = [1.0, 0.0, 0.0, 1.0];
        let blue = [0.0, 0.0, 1.0, 1.0];

        assert_eq!(LumaWeights::CAMERA.intensity(red), 0.114);
        assert_eq!(LumaWeights::CAMERA.intensity(blue), 0.299);
        assert_eq!(LumaWeights::REC601.intensity(red), 0.299);
    }

    /// Test that any input produces only black and opaque white pixels
    #[test]
    fn test_two_tone() {
        let frame = noise(23, 11);

        for &level in &[0.0, 0.2, DEFAULT_LEVEL, 0.9, 1.1] {
            let out = threshold(&frame, level, LumaWeights::default());
            assert_eq!((out.width(), out.height()), (23, 11));
            assert!(is_two_tone(&out));
        }
    }

    /// Test that thresholding a thresholded frame changes nothing
    #[test]
    fn test_idempotent() {
        let once = threshold(&noise(16, 16), DEFAULT_LEVEL, LumaWeights::default());
        let twice = threshold(&once, DEFAULT_LEVEL, LumaWeights::default());

        assert!(once.pixels().any(|p| p == WHITE));
        assert!(once.pixels().any(|p| p == BLACK));
        assert_eq!(once, twice);
    }

    /// Test that a missing input is reported, and the processor passes frames through
    #[test]
    fn test_filter_unavailable() {
        let filter = ThresholdFilter::default();

        match filter.output_image(None) {
            Err(Error::FilterUnavailable) => (),
            other => panic!("Unexpected result {:?}", other)
        }

        let frame = Frame::solid(2, 2, [0.9, 0.9, 0.9, 0.5]);
        assert_eq!(filter.process(&frame).unwrap(), Frame::solid(2, 2, WHITE));
    }

    /// Test that Otsu's method splits a two level frame between its levels
    #[test]
    fn test_otsu_level() {
        let frame = Frame::new(Rgba32FImage::from_fn(10, 10, |x, _| {
            if x < 5 { Rgba([0.2, 0.2, 0.2, 1.0]) } else { Rgba([0.8, 0.8, 0.8, 1.0]) }
        }));
        let weights = LumaWeights::default();
        let level = otsu_level(&frame, weights);

        assert!(level > 0.2 && level < 0.8);

        let out = threshold(&frame, level, weights);
        assert_eq!(out.pixel(0, 0), BLACK);
        assert_eq!(out.pixel(9, 9), WHITE);
    }

    /// Test the Otsu split between two clusters in adjacent histogram bins
    #[test]
    fn test_otsu_level_adjacent_bins() {
        // Intensities round to bins 100 and 101, the bright ones sit below 101 / 255
        let dark = 99.8 / 255.0;
        let bright = 100.6 / 255.0;
        let frame = Frame::new(Rgba32FImage::from_fn(8, 4, |x, _| {
            let v = if x < 4 { dark } else { bright };
            Rgba([v, v, v, 1.0])
        }));
        let weights = LumaWeights::default();
        let level = otsu_level(&frame, weights);

        assert!((level - 100.5 / 255.0).abs() < 1e-6);

        let out = threshold(&frame, level, weights);
        for y in 0..4 {
            for x in 0..8 {
                let expected = if x < 4 { BLACK } else { WHITE };
                assert_eq!(out.pixel(x, y), expected);
            }
        }
    }
}
