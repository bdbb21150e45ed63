//! Frame sequencing for multi-frame transactions.
//!
//! A sequential transfer sends several frames under one bus transaction. The
//! [`FrameSequencer`] tracks which frame the current chunk belongs to and
//! reports whether it opens or closes the whole transaction. A frame only
//! counts as done on its last chunk.

use crate::constants::{FIRST_FRAME_INDEX, SINGLE_FRAME};
use crate::error::{TransferError, TransferResult};

use super::chunk::Chunk;

/// Frame position of one builder call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameFlags {
    /// Sequencing is active (`frame_count > 1`)
    pub sequential: bool,
    /// Call opens the first frame
    pub first: bool,
    /// Call closes the last frame
    pub last: bool,
    /// 1-based frame the call belongs to
    pub index: usize,
}

impl FrameFlags {
    /// Flags for a transfer with sequencing disabled.
    #[must_use]
    pub const fn single() -> Self {
        Self {
            sequential: false,
            first: true,
            last: true,
            index: FIRST_FRAME_INDEX,
        }
    }
}

/// 1-based frame counter, wrapping to 1 after the last frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameSequencer {
    frame_index: usize,
    /// Frame count of the sequence in flight, 0 when idle
    active_count: usize,
}

impl FrameSequencer {
    /// Idle sequencer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frame_index: FIRST_FRAME_INDEX,
            active_count: 0,
        }
    }

    /// Frame the next call belongs to
    #[inline(always)]
    #[must_use]
    pub const fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Check if a multi-frame sequence is in flight
    #[inline(always)]
    #[must_use]
    pub const fn in_sequence(&self) -> bool {
        self.active_count != 0
    }

    /// Abandon the sequence in flight
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Classify `chunk` within a transaction of `frame_count` frames.
    ///
    /// # Errors
    ///
    /// - `TransferError::InvalidFrameCount` if `frame_count` is zero
    /// - `TransferError::FrameCountMismatch` if a sequence of a different
    ///   frame count is in flight
    pub fn advance(&mut self, frame_count: usize, chunk: &Chunk) -> TransferResult<FrameFlags> {
        if frame_count == 0 {
            return Err(TransferError::InvalidFrameCount);
        }
        if self.in_sequence() && frame_count != self.active_count {
            return Err(TransferError::FrameCountMismatch);
        }
        if frame_count == SINGLE_FRAME {
            return Ok(FrameFlags::single());
        }

        let index = self.frame_index;
        let done = chunk.last;
        let mut flags = FrameFlags {
            sequential: true,
            first: false,
            last: false,
            index,
        };
        self.active_count = frame_count;

        if index == FIRST_FRAME_INDEX && chunk.first {
            flags.first = true;
            if done {
                self.frame_index += 1;
            }
        } else if index == frame_count && done {
            flags.last = true;
            *self = Self::new();
        } else if done {
            self.frame_index += 1;
        }

        Ok(flags)
    }
}

impl Default for FrameSequencer {
    fn default() -> Self {
        Self::new()
    }
}
