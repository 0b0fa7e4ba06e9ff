//! # Sample Buffer Module
//!
//! Holds the sliding analysis window fed by the audio source. The window is
//! divided into fixed-size chunk slots; chunks fill the slots in arrival
//! order and, once every slot is occupied, each new chunk shifts the window
//! left by one slot and lands in the last one.

use crate::error::{EngineError, Result};

/// Sliding window over the most recent capture chunks.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    capture_size: usize,
    data: Vec<f32>,
    // Write position while filling; equals `data.len()` once full.
    pointer: usize,
    chunks_pushed: u64,
}

impl SampleBuffer {
    /// Creates an empty window of `window_chunks` slots of `capture_size` samples.
    pub fn new(capture_size: usize, window_chunks: usize) -> Self {
        Self {
            capture_size,
            data: vec![0.0; capture_size * window_chunks],
            pointer: 0,
            chunks_pushed: 0,
        }
    }

    /// Appends one capture chunk, evicting the oldest once the window is full.
    ///
    /// # Arguments
    /// * `chunk` - Exactly `capture_size` samples
    ///
    /// # Returns
    /// * `Err(EngineError::ChunkSize)` - The chunk had the wrong length; the
    ///   window is left unchanged
    pub fn push(&mut self, chunk: &[f32]) -> Result<()> {
        if chunk.len() != self.capture_size {
            return Err(EngineError::ChunkSize {
                expected: self.capture_size,
                got: chunk.len(),
            });
        }

        if self.is_full() {
            let tail = self.data.len() - self.capture_size;
            self.data.copy_within(self.capture_size.., 0);
            self.data[tail..].copy_from_slice(chunk);
        } else {
            self.data[self.pointer..self.pointer + self.capture_size].copy_from_slice(chunk);
            self.pointer += self.capture_size;
        }
        self.chunks_pushed += 1;
        Ok(())
    }

    /// True once every slot has been filled at least once. Never reverts.
    pub fn is_full(&self) -> bool {
        self.pointer == self.data.len()
    }

    /// The current window contents, oldest chunk first.
    pub fn window(&self) -> &[f32] {
        &self.data
    }

    /// Chunks accepted since creation, evicted ones included.
    pub fn chunks_pushed(&self) -> u64 {
        self.chunks_pushed
    }
}
