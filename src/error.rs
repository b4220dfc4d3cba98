//! # `cv_colorsense` Error module
//!
//! Provides abstractions over errors which can occur during this crate's use.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::PathBuf;

use serde_any;
use thiserror;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Result type used by faillible functions inside the `cv_colorsense` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors which can occur during use of the `cv_colorsense` crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Cannot find file at {0:?}")]
    FileNotFound(PathBuf),

    #[error("Error deserialising data: {0}")]
    DeserialisationError(serde_any::Error),

    #[error("Error building camera stream: {0}")]
    CamStreamBuildError(String),

    #[error("Error starting camera: {0}")]
    CamStartError(String),

    #[error("Error capturing camera image: {0}")]
    CameraCaptureError(std::io::Error),

    #[error("Unsupported image format {0:?}")]
    ImageFormatError(String),

    #[error("Error occured while converting an image: {0}")]
    ImageConversionError(image::ImageError),

    #[error("Buffer of {len} bytes cannot hold a {width}x{height} RGBA8 frame")]
    InvalidFrameBuffer {
        width: u32,
        height: u32,
        len: usize
    },

    #[error("Sample window does not contain any pixel of the frame")]
    EmptyWindow,

    #[error("Threshold filter has no input image")]
    FilterUnavailable,

    #[error("Frame source has no more frames")]
    StreamEnded,

    #[error("Pipeline worker thread panicked")]
    ThreadJoinError
}
