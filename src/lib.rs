//! # Colour sensing on camera streams
//!
//! This crate reads frames from a camera stream and, for every frame, either reports the colour
//! under a sample point as a readable `R,G,B` label or thresholds the frame to pure black and
//! white on a weighted luma value.
//!
//! Frames come from a [`FrameSource`]: a V4L2 camera through
//! [`rscam`](https://github.com/loyd/rscam) (with the `v4l2` feature, Linux only), a list of image
//! files, or frames held in memory. A [`Pipeline`] processes them on a background thread and
//! publishes the latest result for the presentation layer to pick up.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cv_colorsense::prelude::*;
//!
//! let pipeline = PipelineBuilder::new()
//!     // Report the colour in a 5x5 window around the center of each frame
//!     .color_sampler()
//!     .radius(2)
//!     .build(FileStream::new(vec!["frame0.png", "frame1.png"]));
//!
//! // Anything from a different thread can poll the slot
//! let slot = pipeline.slot();
//!
//! pipeline.wait().expect("Pipeline worker panicked");
//!
//! if let Some(readout) = slot.take() {
//!     println!("{} (text colour {})", readout.text, readout.foreground);
//! }
//! ```
//!
//! Thresholding is built the same way, the parameters can also be loaded from a file:
//!
//! ```rust,no_run
//! use cv_colorsense::prelude::*;
//!
//! let pipeline = PipelineBuilder::new()
//!     .threshold()
//!     .params_from_file("threshold.toml")
//!     .expect("Cannot load threshold parameters")
//!     .build(FileStream::new(vec!["frame0.png"]));
//! ```

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use builder::{Configurable, PipelineBuilder, SamplerPipelineBuilder, ThresholdPipelineBuilder};
#[cfg(feature = "v4l2")]
pub use builder::CamStreamBuilder;
#[cfg(feature = "v4l2")]
pub use camstream::MonoCamStream;
pub use error::{Error, Result};
pub use frame::{Frame, Rotation};
pub use pipeline::{FrameProcessor, Pipeline, PipelineStats};
pub use readout::{ColorReadout, LatestSlot, Rgb8};
pub use sampler::{average_color, AveragedColor, ColorSampler, SampleWindow, SamplerParams};
pub use source::{CapturedFrame, FileStream, FrameSource, MemoryStream};
pub use threshold::{otsu_level, threshold, LumaWeights, ThresholdFilter, ThresholdParams};

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod builder;
#[cfg(feature = "v4l2")]
mod camstream;
mod error;
mod frame;
mod pipeline;
mod readout;
pub mod sampler;
mod source;
pub mod threshold;

pub mod prelude {
    pub use crate::{Configurable, PipelineBuilder};
    pub use crate::{FileStream, FrameSource, MemoryStream};
    pub use crate::{ColorReadout, Frame, LatestSlot, Pipeline, Rotation};
    #[cfg(feature = "v4l2")]
    pub use crate::CamStreamBuilder;
}
