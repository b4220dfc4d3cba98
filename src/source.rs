//! # Frame Source Module
//!
//! Sources deliver the frames a pipeline processes. Besides the V4L2 camera stream (behind the
//! `v4l2` feature) frames can be replayed from memory or decoded from image files.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::frame::{Frame, Rotation};

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Timestamp step between replayed frames, 30 frames per second.
pub const REPLAY_INTERVAL_US: u64 = 33_333;

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait FrameSource {
    /// Capture the next frame.
    ///
    /// Finite sources return [`Error::StreamEnded`] once they are exhausted, any other error
    /// only concerns the frame being captured.
    fn capture(&mut self) -> Result<CapturedFrame>;
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTS
// -----------------------------------------------------------------------------------------------

/// A frame as delivered by a source.
#[derive(Clone, Debug)]
pub struct CapturedFrame {
    pub frame: Frame,

    /// Capture time in microseconds
    pub timestamp: u64,

    /// Rotation the source reports the frame needs to be upright. Informational only, the
    /// pipeline applies its own fixed rotation.
    pub orientation: Rotation
}

/// Replays a list of in-memory frames once.
pub struct MemoryStream {
    frames: VecDeque<Frame>,
    next_timestamp: u64
}

/// Decodes a list of image files in order, one frame per file.
pub struct FileStream {
    paths: VecDeque<PathBuf>,
    next_timestamp: u64
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl MemoryStream {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
            next_timestamp: 0
        }
    }
}

impl FrameSource for MemoryStream {
    fn capture(&mut self) -> Result<CapturedFrame> {
        let frame = self.frames.pop_front().ok_or(Error::StreamEnded)?;

        Ok(CapturedFrame {
            frame,
            timestamp: advance(&mut self.next_timestamp),
            orientation: Rotation::None
        })
    }
}

impl FileStream {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>
    {
        Self {
            paths: paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
            next_timestamp: 0
        }
    }
}

impl FrameSource for FileStream {
    /// Decode the next file.
    ///
    /// A missing or undecodable file fails only its own frame, the following call moves on to
    /// the next file.
    fn capture(&mut self) -> Result<CapturedFrame> {
        let path = self.paths.pop_front().ok_or(Error::StreamEnded)?;
        let timestamp = advance(&mut self.next_timestamp);

        if !path.exists() {
            return Err(Error::FileNotFound(path));
        }

        let img = image::open(&path).map_err(|e| Error::ImageConversionError(e))?;

        Ok(CapturedFrame {
            frame: Frame::from_dynamic(&img),
            timestamp,
            orientation: Rotation::None
        })
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Return the current replay timestamp and step it forward.
fn advance(next: &mut u64) -> u64 {
    let ts = *next;
    *next += REPLAY_INTERVAL_US;

    ts
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
