//! Double-buffered pixel frames.
//!
//! [`FrameBuffer`] is written pixel by pixel by a single producer (the
//! sampler). [`present`](FrameBuffer::present) copies the finished back
//! buffer into an immutable [`Frame`] and swaps it into the shared
//! [`FrameSlot`], so a presenter holding an `Arc<Frame>` never sees a
//! partially recolored image.
//!
//! Presented frames are recycled once every presenter has dropped them,
//! which keeps steady-state presentation allocation-free.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use vivarium_core::{cell_count, Generation};

use crate::buffer::try_buffer;
use crate::color::{Color, BACKGROUND};
use crate::error::RenderError;

/// Number of preallocated frames kept for recycling.
const SPARE_FRAMES: usize = 2;

/// A complete, immutable image of one sampled generation.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    size: usize,
    generation: Generation,
    pixels: Vec<Color>,
}

impl Frame {
    /// Side length in pixels.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Generation that was published when this frame was sampled.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Row-major pixels.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Pixel at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.pixels.get(y * self.size + x).copied()
    }
}

/// Shared hand-off point between the frame producer and presenters.
///
/// Holds the most recently presented frame.
#[derive(Debug, Default)]
pub struct FrameSlot {
    latest: Mutex<Option<Arc<Frame>>>,
    presented: AtomicU64,
}

// Compile-time assertion: FrameSlot must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<FrameSlot>();
};

impl FrameSlot {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently presented frame, if any.
    pub fn latest(&self) -> Option<Arc<Frame>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Total frames presented into this slot.
    pub fn presented(&self) -> u64 {
        self.presented.load(Ordering::Acquire)
    }

    /// Drop the current frame (e.g. when the grid is cleared).
    pub fn clear(&self) {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Swap in `frame`, returning the frame it displaced.
    fn publish(&self, frame: Arc<Frame>) -> Option<Arc<Frame>> {
        let prev = self
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(frame);
        self.presented.fetch_add(1, Ordering::Release);
        prev
    }
}

/// Single-producer back buffer sized to a grid.
pub struct FrameBuffer {
    size: usize,
    back: Vec<Color>,
    spares: Vec<Arc<Frame>>,
    slot: Arc<FrameSlot>,
}

impl FrameBuffer {
    /// Allocate a `size` x `size` buffer presenting into `slot`.
    ///
    /// All buffers (back buffer plus recycled frames) are allocated up
    /// front so allocation failure surfaces here rather than mid-sample.
    pub fn new(size: usize, slot: Arc<FrameSlot>) -> Result<Self, RenderError> {
        let count = cell_count(size).map_err(|_| RenderError::InvalidSize { size })?;
        let back = try_buffer(count, BACKGROUND, "frame back buffer")?;
        let mut spares = Vec::with_capacity(SPARE_FRAMES);
        for _ in 0..SPARE_FRAMES {
            spares.push(Arc::new(Frame {
                size,
                generation: Generation::ZERO,
                pixels: try_buffer(count, BACKGROUND, "presented frame")?,
            }));
        }
        Ok(Self {
            size,
            back,
            spares,
            slot,
        })
    }

    /// Side length in pixels.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The slot this buffer presents into.
    pub fn slot(&self) -> &Arc<FrameSlot> {
        &self.slot
    }

    /// The unpresented back buffer.
    pub fn back(&self) -> &[Color] {
        &self.back
    }

    /// Mutable row-major access to the back buffer.
    pub fn back_mut(&mut self) -> &mut [Color] {
        &mut self.back
    }

    /// Write one pixel of the back buffer. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if x < self.size && y < self.size {
            self.back[y * self.size + x] = color;
        }
    }

    /// Publish the back buffer as the frame for `generation`.
    pub fn present(&mut self, generation: Generation) {
        let frame = match self.take_spare() {
            Some(mut arc) => {
                if let Some(frame) = Arc::get_mut(&mut arc) {
                    frame.pixels.copy_from_slice(&self.back);
                    frame.generation = generation;
                }
                arc
            }
            None => Arc::new(Frame {
                size: self.size,
                generation,
                pixels: self.back.clone(),
            }),
        };
        if let Some(prev) = self.slot.publish(frame) {
            if prev.size == self.size && self.spares.len() < SPARE_FRAMES {
                self.spares.push(prev);
            }
        }
    }

    /// Pop a spare frame nobody else is holding.
    fn take_spare(&mut self) -> Option<Arc<Frame>> {
        while let Some(mut arc) = self.spares.pop() {
            if Arc::get_mut(&mut arc).is_some() {
                return Some(arc);
            }
        }
        None
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("size", &self.size)
            .field("spares", &self.spares.len())
            .finish()
    }
}
