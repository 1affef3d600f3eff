//! Display sink contract.
//!
//! A sink is anything that accepts a finished frame: an LED matrix driver, a
//! terminal preview, a PNG file.  Pushing is fire-and-forget from the engine's
//! point of view; a failed push is logged by the [`DisplayManager`] and the
//! next frame is pushed as usual.
//!
//! Running without a sink (headless) is represented by the display manager
//! holding `None`, not by a special sink type.
//!
//! [`DisplayManager`]: super::display_manager::DisplayManager

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::canvas::Canvas;

/// Error type for sink operations.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("display device error: {0}")]
    Device(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image encoding error: {0}")]
    Encode(#[from] image::ImageError),
}

/// Consumer of finished frames.
#[async_trait]
pub trait DisplaySink: Send + Sync {
    /// Outputs one finished frame.
    async fn push(&self, frame: &Canvas) -> Result<(), SinkError>;
}

/// Sink that keeps every pushed frame in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    frames: Mutex<Vec<Canvas>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames pushed so far.
    pub fn frame_count(&self) -> usize {
        self.frames.lock().map(|f| f.len()).unwrap_or(0)
    }

    /// The most recently pushed frame.
    pub fn last_frame(&self) -> Option<Canvas> {
        self.frames.lock().ok().and_then(|f| f.last().cloned())
    }

    /// Removes and returns every frame pushed so far.
    pub fn take_frames(&self) -> Vec<Canvas> {
        self.frames
            .lock()
            .map(|mut f| std::mem::take(&mut *f))
            .unwrap_or_default()
    }
}

#[async_trait]
impl DisplaySink for MemorySink {
    async fn push(&self, frame: &Canvas) -> Result<(), SinkError> {
        self.frames
            .lock()
            .map_err(|_| SinkError::Device("frame store lock poisoned".into()))?
            .push(frame.clone());
        Ok(())
    }
}
