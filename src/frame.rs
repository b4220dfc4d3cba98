//! # Frame Module
//!
//! The frame type shared by every stage of the pipeline, stored as normalised RGBA floats.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::{imageops, DynamicImage, Rgba, Rgba32FImage, RgbaImage};

use crate::error::{Error, Result};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// An immutable RGBA image with every channel normalised to `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    buf: Rgba32FImage
}

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Clockwise rotation applied to a frame before it is processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Frame {
    /// Wrap an existing float buffer.
    ///
    /// Channels are clamped to `[0, 1]`, NaN becomes `0`.
    pub fn new(mut buf: Rgba32FImage) -> Self {
        for p in buf.pixels_mut() {
            p.0 = clamp_pixel(p.0);
        }

        Self { buf }
    }

    /// Create a frame where every pixel has the same value, clamped as in [`Frame::new`].
    pub fn solid(width: u32, height: u32, pixel: [f32; 4]) -> Self {
        Self {
            buf: Rgba32FImage::from_pixel(width, height, Rgba(clamp_pixel(pixel)))
        }
    }

    /// Convert any decoded image into a frame.
    ///
    /// Float images (e.g. HDR or OpenEXR files) may hold values outside `[0, 1]`, these are
    /// clamped as in [`Frame::new`].
    pub fn from_dynamic(img: &DynamicImage) -> Self {
        Self::new(img.to_rgba32f())
    }

    /// Build a frame from tightly packed RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let len = data.len();
        let img = RgbaImage::from_raw(width, height, data)
            .ok_or(Error::InvalidFrameBuffer { width, height, len })?;

        Ok(Self::from_dynamic(&DynamicImage::ImageRgba8(img)))
    }

    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    /// `true` if the frame holds no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.buf.width() == 0 || self.buf.height() == 0
    }

    /// Get the `[r, g, b, a]` value of the pixel at `(x, y)`.
    ///
    /// Panics if the coordinates are outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.buf.get_pixel(x, y).0
    }

    /// Iterate over every pixel in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [f32; 4]> + '_ {
        self.buf.pixels().map(|p| p.0)
    }

    /// Borrow the underlying float buffer.
    pub fn as_rgba32f(&self) -> &Rgba32FImage {
        &self.buf
    }

    /// Convert the frame to 8 bit RGBA, e.g. for display.
    pub fn to_rgba8(&self) -> RgbaImage {
        DynamicImage::ImageRgba32F(self.buf.clone()).to_rgba8()
    }

    /// Return a new frame rotated clockwise by `rotation`.
    pub fn rotated(&self, rotation: Rotation) -> Self {
        let buf = match rotation {
            Rotation::None => self.buf.clone(),
            Rotation::Clockwise90 => imageops::rotate90(&self.buf),
            Rotation::Clockwise180 => imageops::rotate180(&self.buf),
            Rotation::Clockwise270 => imageops::rotate270(&self.buf)
        };

        Self { buf }
    }

    /// Build a frame of the same size by mapping every pixel independently.
    pub(crate) fn map_pixels<F>(&self, f: F) -> Self
    where
        F: Fn([f32; 4]) -> [f32; 4]
    {
        let mut buf = self.buf.clone();
        for p in buf.pixels_mut() {
            p.0 = f(p.0);
        }

        Self { buf }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::None
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn clamp_channel(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.max(0.0).min(1.0)
    }
}

fn clamp_pixel(p: [f32; 4]) -> [f32; 4] {
    [clamp_channel(p[0]), clamp_channel(p[1]), clamp_channel(p[2]), clamp_channel(p[3])]
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
