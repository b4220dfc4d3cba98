//! # Camera Stream Module
//!
//! This module provides a V4L2 camera as a [`FrameSource`], through
//! [`rscam`](https://github.com/loyd/rscam). Only available with the `v4l2` feature.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::{DynamicImage, ImageFormat};
use rscam::Camera;

use crate::error::{Error, Result};
use crate::frame::{Frame, Rotation};
use crate::source::{CapturedFrame, FrameSource};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTS
// -----------------------------------------------------------------------------------------------

pub struct MonoCamStream {
    camera: Camera,

    img_format: ImageFormat,

    orientation: Rotation
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl MonoCamStream {
    /// Create a new stream from an already started camera.
    pub(crate) fn new(camera: Camera, img_format: ImageFormat, orientation: Rotation) -> Self {
        Self {
            camera,
            img_format,
            orientation
        }
    }
}

impl FrameSource for MonoCamStream {
    /// Capture an image from the camera.
    fn capture(&mut self) -> Result<CapturedFrame> {
        // Get the frame from the camera
        let rscam_frame = self.camera.capture()
            .map_err(|e| Error::CameraCaptureError(e))?;

        let timestamp = rscam_frame.get_timestamp();

        // Convert the frame into an image
        let img = rscam_frame_to_dynamic_image(&rscam_frame, self.img_format)?;

        Ok(CapturedFrame {
            frame: Frame::from_dynamic(&img),
            timestamp,
            orientation: self.orientation
        })
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Convert the bytes of an `rscam::Frame` into an `image::DynamicImage`.
fn rscam_frame_to_dynamic_image(frame: &[u8], format: ImageFormat) -> Result<DynamicImage> {
    image::load_from_memory_with_format(frame, format)
        .map_err(|e| Error::ImageConversionError(e))
}
