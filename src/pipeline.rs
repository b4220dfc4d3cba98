//! # Pipeline Module
//!
//! Runs a frame processor over a frame source on a background worker thread, handing each result
//! to the presentation layer through a [`LatestSlot`].
//!
//! Frames are processed strictly one at a time, in the order the source delivers them. A frame
//! which cannot be captured, decoded or processed is dropped and the worker moves on to the next
//! one, nothing is retried and no error reaches the presentation layer.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use log::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::frame::{Frame, Rotation};
use crate::readout::LatestSlot;
use crate::source::FrameSource;

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

/// A stateless per-frame computation run by the pipeline.
pub trait FrameProcessor {
    type Output;

    /// Process a single frame.
    fn process(&self, frame: &Frame) -> Result<Self::Output>;
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTS
// -----------------------------------------------------------------------------------------------

/// A running pipeline, owning its worker thread.
pub struct Pipeline<T> {
    jh: JoinHandle<PipelineStats>,
    cmd_tx: Sender<WorkerCmd>,
    slot: LatestSlot<T>
}

/// Frame counts reported when a pipeline finishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Frames whose result was published
    pub processed: u64,

    /// Frames dropped because of a capture, decode or processing error
    pub dropped: u64
}

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Commands that can be sent by the owning thread to the worker thread.
enum WorkerCmd {
    /// Stop after the frame in progress
    Stop
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl<T: Send + 'static> Pipeline<T> {
    /// Start a worker pulling frames from `source`, rotating them by `rotation` and running
    /// `processor` on them.
    pub fn spawn<S, P>(source: S, processor: P, rotation: Rotation) -> Self
    where
        S: FrameSource + Send + 'static,
        P: FrameProcessor<Output = T> + Send + 'static
    {
        let (cmd_tx, cmd_rx) = channel();
        let slot = LatestSlot::new();

        let jh = worker_thread(source, processor, rotation, cmd_rx, slot.clone());

        Self { jh, cmd_tx, slot }
    }
}

impl<T> Pipeline<T> {
    /// Get a handle to the slot results are published to.
    pub fn slot(&self) -> LatestSlot<T> {
        self.slot.clone()
    }

    /// Take the most recent result, if one arrived since the last call.
    pub fn latest(&self) -> Option<T> {
        self.slot.take()
    }

    /// Stop the worker after the frame in progress and wait for it to exit.
    pub fn stop(self) -> Result<PipelineStats> {
        if self.cmd_tx.send(WorkerCmd::Stop).is_err() {
            debug!("Pipeline worker already exited");
        }

        self.jh.join().map_err(|_| Error::ThreadJoinError)
    }

    /// Wait for the worker to exit on its own, i.e. once the source has no more frames.
    pub fn wait(self) -> Result<PipelineStats> {
        self.jh.join().map_err(|_| Error::ThreadJoinError)
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Process frames from the given source in a separate thread.
fn worker_thread<S, P>(
    mut source: S,
    processor: P,
    rotation: Rotation,
    cmd_rx: Receiver<WorkerCmd>,
    slot: LatestSlot<P::Output>
) -> JoinHandle<PipelineStats>
where
    S: FrameSource + Send + 'static,
    P: FrameProcessor + Send + 'static,
    P::Output: Send + 'static
{
    thread::spawn(move || {
        let mut stats = PipelineStats::default();
        info!("Pipeline worker started");

        loop {
            match cmd_rx.try_recv() {
                Ok(WorkerCmd::Stop) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => ()
            }

            let captured = match source.capture() {
                Ok(c) => c,
                Err(Error::StreamEnded) => {
                    debug!("Frame source ended");
                    break
                },
                Err(e @ Error::CameraCaptureError(_)) => {
                    warn!("Dropping frame: {}", e);
                    stats.dropped += 1;
                    continue
                },
                Err(e) => {
                    debug!("Dropping frame: {}", e);
                    stats.dropped += 1;
                    continue
                }
            };

            let frame = match rotation {
                Rotation::None => captured.frame,
                r => captured.frame.rotated(r)
            };

            match processor.process(&frame) {
                Ok(out) => {
                    trace!("Processed frame at {}us", captured.timestamp);
                    slot.publish(out);
                    stats.processed += 1;
                },
                Err(e) => {
                    debug!("Dropping frame at {}us: {}", captured.timestamp, e);
                    stats.dropped += 1;
                }
            }
        }

        info!(
            "Pipeline worker stopped, {} frames processed, {} dropped",
            stats.processed,
            stats.dropped
        );

        stats
    })
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
