//! Caller-owned chunk and frame state.
//!
//! One [`Transaction`] follows one logical transfer across builder calls. Each
//! call emits exactly one chunk and yields a [`TransferStep`] describing where
//! that chunk sits in its frame and in the whole transaction.
//!
//! # Example
//!
//! ```ignore
//! let mut txn = Transaction::new(255)?;
//!
//! let step = txn.plan(400, 1)?; // offset 0, len 255
//! let step = txn.plan(400, 1)?; // offset 255, len 145, last chunk
//! ```

pub mod chunk;
pub mod sequence;

pub use chunk::{Chunk, ChunkCursor};
pub use sequence::{FrameFlags, FrameSequencer};

use crate::error::TransferResult;

/// Position of one emitted chunk within its frame and transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferStep {
    /// Chunk within the current frame
    pub chunk: Chunk,
    /// Frame within the transaction
    pub frame: FrameFlags,
}

impl TransferStep {
    /// Element offset of the chunk in the frame buffer
    #[inline(always)]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.chunk.offset
    }

    /// Element count of the chunk
    #[inline(always)]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.chunk.len
    }

    /// Check if the chunk is empty (never true for a planned step)
    #[inline(always)]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.chunk.len == 0
    }

    /// The step opens the transaction: enclosing setup nodes are due.
    #[must_use]
    pub const fn needs_setup(&self) -> bool {
        if self.frame.sequential {
            self.frame.first
        } else {
            self.chunk.first
        }
    }

    /// The step closes the transaction: enclosing teardown nodes are due.
    #[must_use]
    pub const fn needs_teardown(&self) -> bool {
        if self.frame.sequential {
            self.frame.last
        } else {
            self.chunk.last
        }
    }
}

/// Chunk and frame bookkeeping of one logical transfer.
///
/// Replaying the same calls against a fresh (or reset) transaction yields the
/// same steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transaction {
    chunks: ChunkCursor,
    frames: FrameSequencer,
}

impl Transaction {
    /// Create a transaction for a per-node ceiling of `max_chunk_size` elements.
    ///
    /// # Errors
    ///
    /// `TransferError::InvalidChunkSize` if the ceiling is zero.
    pub const fn new(max_chunk_size: usize) -> TransferResult<Self> {
        match ChunkCursor::new(max_chunk_size) {
            Ok(chunks) => Ok(Self {
                chunks,
                frames: FrameSequencer::new(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Per-node ceiling
    #[inline(always)]
    #[must_use]
    pub const fn max_chunk_size(&self) -> usize {
        self.chunks.max_chunk_size()
    }

    /// Elements of the current frame already emitted
    #[inline(always)]
    #[must_use]
    pub const fn chunk_cursor(&self) -> usize {
        self.chunks.position()
    }

    /// Frame the next call belongs to
    #[inline(always)]
    #[must_use]
    pub const fn frame_index(&self) -> usize {
        self.frames.frame_index()
    }

    /// Check if neither a chunk sequence nor a frame sequence is in flight
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !self.chunks.in_sequence() && !self.frames.in_sequence()
    }

    /// Abandon any transfer in flight
    pub fn reset(&mut self) {
        self.chunks.reset();
        self.frames.reset();
    }

    /// Emit the next chunk of a frame of `size` elements in a transaction of
    /// `frame_count` frames.
    ///
    /// State is only updated when the step is valid.
    ///
    /// # Errors
    ///
    /// - `TransferError::InvalidSize` for a zero or inconsistent `size`
    /// - `TransferError::InvalidFrameCount` for a zero `frame_count`
    /// - `TransferError::FrameCountMismatch` if `frame_count` changed mid-sequence
    pub fn plan(&mut self, size: usize, frame_count: usize) -> TransferResult<TransferStep> {
        let mut next = *self;
        let chunk = next.chunks.next_chunk(size)?;
        let frame = next.frames.advance(frame_count, &chunk)?;
        *self = next;
        Ok(TransferStep { chunk, frame })
    }
}
