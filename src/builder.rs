//! # Builder implementations
//!
//! This module implements the builders for pipelines and, with the `v4l2` feature, for camera
//! stream objects.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;
#[cfg(feature = "v4l2")]
use std::path::PathBuf;

use serde_any;
use serde::de::DeserializeOwned;
#[cfg(feature = "v4l2")]
use image::ImageFormat;
#[cfg(feature = "v4l2")]
use rscam::Config;

use crate::error::{Error, Result};
use crate::frame::Rotation;
use crate::pipeline::Pipeline;
use crate::readout::ColorReadout;
use crate::sampler::{ColorSampler, SamplerParams};
use crate::source::FrameSource;
use crate::threshold::{LumaWeights, ThresholdFilter, ThresholdParams};
use crate::Frame;
#[cfg(feature = "v4l2")]
use crate::camstream::MonoCamStream;

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

/// Provides common methods for setting the processing parameters of a pipeline builder.
pub trait Configurable: Sized {
    /// The parameters to be used, must be deserialisable.
    type Params: DeserializeOwned;

    fn params(self, params: Self::Params) -> Self;

    /// Load the parameters from a file.
    ///
    /// The file type will be guessed at runtime, any file type supported by
    /// [`serde_any`](https://docs.rs/serde_any/0.5.0/serde_any/) is supported, but it must be
    /// deserialisable into `Self::Params`.
    fn params_from_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        // Check the file exitsts
        if !path.as_ref().exists() {
            return Err(Error::FileNotFound(path.as_ref().to_path_buf()));
        }

        // Load the parameters from the file, guessing which format they're in using serde_any
        let p = serde_any::from_file(path)
            .map_err(|e| Error::DeserialisationError(e))?;

        Ok(self.params(p))
    }
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Entry point for building a pipeline.
pub struct PipelineBuilder {}

pub struct SamplerPipelineBuilder {
    params: SamplerParams,

    rotation: Rotation
}

pub struct ThresholdPipelineBuilder {
    params: ThresholdParams,

    rotation: Rotation
}

#[cfg(feature = "v4l2")]
pub struct CamStreamBuilder<'a> {
    path: Option<PathBuf>,

    img_format: Option<ImageFormat>,

    orientation: Rotation,

    config: Config<'a>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {}
    }

    /// Build a pipeline reporting the colour under the sample point.
    ///
    /// Frames are sampled as delivered, without rotation.
    pub fn color_sampler(self) -> SamplerPipelineBuilder {
        SamplerPipelineBuilder {
            params: SamplerParams::default(),
            rotation: Rotation::None
        }
    }

    /// Build a pipeline thresholding each frame.
    ///
    /// Frames are rotated a quarter turn clockwise before thresholding, which puts a landscape
    /// sensor image upright on a portrait display.
    pub fn threshold(self) -> ThresholdPipelineBuilder {
        ThresholdPipelineBuilder {
            params: ThresholdParams::default(),
            rotation: Rotation::Clockwise90
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplerPipelineBuilder {
    /// Set the radius of the sample window, default value is `2`.
    pub fn radius(mut self, radius: i64) -> Self {
        self.params.radius = radius;

        self
    }

    /// Sample at a fixed point rather than at the center of each frame.
    pub fn center(mut self, x: i64, y: i64) -> Self {
        self.params.center = Some([x, y]);

        self
    }

    /// Set the rotation applied to frames before sampling.
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;

        self
    }

    /// Start the pipeline on the given source.
    pub fn build<S>(self, source: S) -> Pipeline<ColorReadout>
    where
        S: FrameSource + Send + 'static
    {
        Pipeline::spawn(source, ColorSampler::new(self.params), self.rotation)
    }
}

impl Configurable for SamplerPipelineBuilder {
    type Params = SamplerParams;

    fn params(mut self, params: Self::Params) -> Self {
        self.params = params;

        self
    }
}

impl ThresholdPipelineBuilder {
    /// Set the intensity level, default value is [`crate::threshold::DEFAULT_LEVEL`].
    pub fn level(mut self, level: f32) -> Self {
        self.params.level = level;

        self
    }

    /// Set the channel weights of the intensity sum.
    pub fn weights(mut self, weights: LumaWeights) -> Self {
        self.params.weights = weights;

        self
    }

    /// Set the rotation applied to frames before thresholding.
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;

        self
    }

    /// Start the pipeline on the given source.
    pub fn build<S>(self, source: S) -> Pipeline<Frame>
    where
        S: FrameSource + Send + 'static
    {
        Pipeline::spawn(source, ThresholdFilter::new(self.params), self.rotation)
    }
}

impl Configurable for ThresholdPipelineBuilder {
    type Params = ThresholdParams;

    fn params(mut self, params: Self::Params) -> Self {
        self.params = params;

        self
    }
}

#[cfg(feature = "v4l2")]
impl<'a> CamStreamBuilder<'a> {
    pub fn new() -> Self {
        Self {
            path: None,
            img_format: None,
            orientation: Rotation::None,
            config: Config::default()
        }
    }

    /// Specify the path of the camera, i.e. the device path, such as `/dev/video1`
    ///
    /// # Returns
    /// - `self` if the path exists, `Err` otherwise
    pub fn path<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        if path.as_ref().exists() {
            self.path = Some(path.as_ref().to_path_buf());

            Ok(self)
        } else {
            Err(Error::FileNotFound(path.as_ref().to_path_buf()))
        }
    }

    /// Set the interval of the camera.
    ///
    /// V4L2 uses intervals rather than framerates, default value is `(1, 10)`.
    pub fn interval(mut self, interval: (u32, u32)) -> Self {
        self.config.interval = interval;

        self
    }

    /// Set the resolution of the camera.
    ///
    /// Default value is `(640, 480)`.
    pub fn resolution(mut self, resolution: (u32, u32)) -> Self {
        self.config.resolution = resolution;

        self
    }

    /// Set the format of the images.
    ///
    /// Uses the FourCC notation, only `b"MJPG"` can currently be decoded.
    pub fn format(mut self, format: &'a [u8]) -> Result<Self> {
        self.img_format = format_from_fourcc(format);

        if self.img_format.is_none() {
            return Err(Error::ImageFormatError(String::from_utf8_lossy(format).into_owned()));
        }

        self.config.format = format;

        Ok(self)
    }

    /// Set the number of buffers in the queue for this camera.
    ///
    /// Default value is 2.
    pub fn num_buffers(mut self, num_buffers: u32) -> Self {
        self.config.nbuffers = num_buffers;

        self
    }

    /// Set the orientation hint reported with every frame.
    pub fn orientation(mut self, orientation: Rotation) -> Self {
        self.orientation = orientation;

        self
    }

    /// Build the camera stream object.
    ///
    /// This function can fail if the underlying V4L2 construction fails.
    pub fn build(self) -> Result<MonoCamStream> {
        let path = self.path
            .ok_or_else(|| Error::CamStreamBuildError(String::from("Missing camera path")))?;
        let img_format = self.img_format
            .ok_or_else(|| Error::CamStreamBuildError(String::from("Missing image format")))?;

        let path_str = path.to_str()
            .ok_or_else(|| Error::CamStreamBuildError(format!("Invalid camera path {:?}", path)))?;

        let mut camera = rscam::Camera::new(path_str)
            .map_err(|e| Error::CamStreamBuildError(format!("{}", e)))?;

        camera.start(&self.config).map_err(|e| Error::CamStartError(format!("{}", e)))?;

        log::info!("Started camera at {:?}", path);

        Ok(MonoCamStream::new(camera, img_format, self.orientation))
    }
}

#[cfg(feature = "v4l2")]
impl<'a> Default for CamStreamBuilder<'a> {
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

#[cfg(feature = "v4l2")]
fn format_from_fourcc(format: &[u8]) -> Option<ImageFormat> {
    match format {
        b"MJPG" => Some(ImageFormat::Jpeg),
        _ => None
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;
    use std::fs;

    use crate::threshold::DEFAULT_LEVEL;

    /// Write `contents` to a fresh file in the temp directory
    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("cv_colorsense_{}", std::process::id()));
        fs::create_dir_all(&dir).expect("Cannot create temp dir");

        let path = dir.join(name);
        fs::write(&path, contents).expect("Cannot write temp file");

        path
    }

    /// Test that sampler parameters load from a TOML file, missing keys keeping their defaults
    #[test]
    fn test_sampler_params_from_file() {
        let path = temp_file("sampler.toml", "center = [10, 20]\n");

        let builder = PipelineBuilder::new()
            .color_sampler()
            .params_from_file(&path)
            .expect("Cannot load the sampler parameters");

        assert_eq!(builder.params, SamplerParams { radius: 2, center: Some([10, 20]) });
    }

    /// Test that threshold parameters load from a JSON file
    #[test]
    fn test_threshold_params_from_file() {
        let path = temp_file(
            "threshold.json",
            r#"{ "level": 0.25, "weights": [0.299, 0.587, 0.114] }"#
        );

        let builder = PipelineBuilder::new()
            .threshold()
            .params_from_file(&path)
            .expect("Cannot load the threshold parameters");

        assert_eq!(builder.params.level, 0.25);
        assert_eq!(builder.params.weights, LumaWeights::REC601);
        assert_eq!(builder.rotation, Rotation::Clockwise90);
    }

    /// Test that a missing parameter file is reported
    #[test]
    fn test_params_file_not_found() {
        match PipelineBuilder::new().threshold().params_from_file("/nonexistent/threshold.toml") {
            Err(Error::FileNotFound(_)) => (),
            Err(e) => panic!("Unexpected error {}", e),
            Ok(_) => panic!("Loaded a missing file")
        }
    }

    /// Test the builder defaults
    #[test]
    fn test_defaults() {
        let t = PipelineBuilder::new().threshold();
        assert_eq!(t.params.level, DEFAULT_LEVEL);

        let s = PipelineBuilder::new().color_sampler().radius(-3).center(1, 2);
        assert_eq!(s.params, SamplerParams { radius: -3, center: Some([1, 2]) });
        assert_eq!(s.rotation, Rotation::None);
    }
}
