//! Batch buffer and flush controller.
//!
//! [`BatchBuffer`] is the plain swap-on-flush container. [`FlushController`]
//! owns one inside a dedicated task and is the only thing that ever detaches a
//! batch, so a size-triggered and a timer-triggered flush can never both see
//! the same contents.

mod controller;

pub use controller::{BufferConfig, BufferHandle, FlushController};

use std::mem;

use crate::core::NewsItem;

/// Why a batch was detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// The buffer reached `batch_size`.
    Size,
    /// The flush interval elapsed.
    Timer,
    /// A caller asked for an explicit flush.
    Manual,
    /// The controller is stopping and drained what was left.
    Shutdown,
}

impl FlushTrigger {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Timer => "timer",
            Self::Manual => "manual",
            Self::Shutdown => "shutdown",
        }
    }
}

/// A detached batch on its way to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Monotonic per controller, starting at 1.
    pub seq: u64,
    pub trigger: FlushTrigger,
    pub items: Vec<NewsItem>,
}

/// Accumulates news items until a flush detaches them.
#[derive(Debug)]
pub struct BatchBuffer {
    items: Vec<NewsItem>,
    batch_size: usize,
}

impl BatchBuffer {
    /// A `batch_size` of zero is treated as one.
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            items: Vec::with_capacity(batch_size),
            batch_size,
        }
    }

    /// Add an item. Returns the detached batch when the buffer reaches `batch_size`.
    pub fn append(&mut self, item: NewsItem) -> Option<Vec<NewsItem>> {
        self.items.push(item);
        if self.items.len() >= self.batch_size {
            self.flush()
        } else {
            None
        }
    }

    /// Swap the contents for an empty buffer. `None` when there is nothing to flush.
    pub fn flush(&mut self) -> Option<Vec<NewsItem>> {
        if self.items.is_empty() {
            return None;
        }
        let fresh = Vec::with_capacity(self.batch_size);
        Some(mem::replace(&mut self.items, fresh))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}
