//! # Readout Module
//!
//! Values handed to the presentation layer, and the single slot they are handed over through.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex, MutexGuard};

use derive_more::Display;

use crate::sampler::AveragedColor;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// An 8 bit RGB colour, displayed as `R,G,B` in decimal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[display(fmt = "{},{},{}", r, g, b)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8
}

/// What the presentation layer shows for a sampled colour.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorReadout {
    /// Label text, `R,G,B` with each channel in `0..=255`
    pub text: String,

    /// The sampled colour itself
    pub background: Rgb8,

    /// Text colour, the complement of the background
    pub foreground: Rgb8,

    /// The normalised colour the readout was derived from
    pub color: AveragedColor
}

/// Hand-off point between the pipeline worker and the presentation layer.
///
/// Only the most recently published value is kept, older values are overwritten without being
/// observed.
pub struct LatestSlot<T> {
    inner: Arc<Mutex<Option<T>>>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Rgb8 {
    /// Convert normalised channels, rounding to the nearest 8 bit value.
    pub fn from_normalised(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: to_u8(r),
            g: to_u8(g),
            b: to_u8(b)
        }
    }
}

impl From<AveragedColor> for Rgb8 {
    fn from(c: AveragedColor) -> Self {
        Self::from_normalised(c.r, c.g, c.b)
    }
}

impl From<AveragedColor> for ColorReadout {
    fn from(color: AveragedColor) -> Self {
        let background = Rgb8::from(color);

        Self {
            text: background.to_string(),
            background,
            foreground: Rgb8::from(color.complement()),
            color
        }
    }
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None))
        }
    }

    /// Store `value`, replacing anything not yet taken.
    pub fn publish(&self, value: T) {
        *self.lock() = Some(value);
    }

    /// Remove and return the latest value, if one has been published since the last take.
    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // A panicking holder cannot leave the slot half written
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: Clone> LatestSlot<T> {
    /// Return a copy of the latest value without removing it.
    pub fn peek(&self) -> Option<T> {
        self.lock().clone()
    }
}

impl<T> Clone for LatestSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner)
        }
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().max(0.0).min(255.0) as u8
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
