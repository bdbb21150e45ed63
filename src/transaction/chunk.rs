//! Chunking of oversized transfers.
//!
//! A frame larger than the per-node ceiling is emitted as consecutive chunks,
//! one per builder call. The caller passes the frame's total size on every
//! call; [`ChunkCursor`] remembers how much of it was already emitted.
//!
//! A caller may instead close an in-flight frame by passing only what is left,
//! as long as it fits one node: 400 bytes at 255 per node is either
//! `next_chunk(400)` twice or `next_chunk(400)` then `next_chunk(145)`.

use crate::error::{TransferError, TransferResult};

/// One bounded slice of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Chunk {
    /// Element offset into the frame buffer
    pub offset: usize,
    /// Element count
    pub len: usize,
    /// First chunk of the frame
    pub first: bool,
    /// Last chunk of the frame
    pub last: bool,
    /// Frame needed more than one chunk
    pub chunked: bool,
}

impl Chunk {
    /// Chunk covering a whole frame that fits one node.
    #[must_use]
    pub const fn whole(len: usize) -> Self {
        Self {
            offset: 0,
            len,
            first: true,
            last: true,
            chunked: false,
        }
    }

    /// One past the last element covered.
    #[inline(always)]
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Chunk position within the frame currently being emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChunkCursor {
    max_chunk_size: usize,
    cursor: usize,
}

impl ChunkCursor {
    /// Create a cursor for a per-node ceiling of `max_chunk_size` elements.
    ///
    /// # Errors
    ///
    /// `TransferError::InvalidChunkSize` if the ceiling is zero.
    pub const fn new(max_chunk_size: usize) -> TransferResult<Self> {
        if max_chunk_size == 0 {
            return Err(TransferError::InvalidChunkSize);
        }
        Ok(Self {
            max_chunk_size,
            cursor: 0,
        })
    }

    /// Per-node ceiling
    #[inline(always)]
    #[must_use]
    pub const fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Elements of the current frame already emitted
    #[inline(always)]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// Check if a frame is partially emitted
    #[inline(always)]
    #[must_use]
    pub const fn in_sequence(&self) -> bool {
        self.cursor != 0
    }

    /// Abandon the partially emitted frame
    #[inline(always)]
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Emit the next chunk of a frame of `total` elements.
    ///
    /// With a frame in flight, a `total` that fits one node is the final
    /// remainder: it is emitted at the cursor as the last chunk.
    ///
    /// # Errors
    ///
    /// `TransferError::InvalidSize` if `total` is zero, or if a frame is in
    /// flight and `total` neither fits one node nor extends past what was
    /// already emitted.
    pub fn next_chunk(&mut self, total: usize) -> TransferResult<Chunk> {
        if total == 0 {
            return Err(TransferError::InvalidSize);
        }
        if self.in_sequence() && total <= self.max_chunk_size {
            let offset = self.cursor;
            self.cursor = 0;
            return Ok(Chunk {
                offset,
                len: total,
                first: false,
                last: true,
                chunked: true,
            });
        }
        if total <= self.cursor {
            return Err(TransferError::InvalidSize);
        }

        let offset = self.cursor;
        let remaining = total - offset;
        let chunked = total > self.max_chunk_size;

        let chunk = if remaining > self.max_chunk_size {
            self.cursor += self.max_chunk_size;
            Chunk {
                offset,
                len: self.max_chunk_size,
                first: offset == 0,
                last: false,
                chunked,
            }
        } else {
            self.cursor = 0;
            Chunk {
                offset,
                len: remaining,
                first: offset == 0,
                last: true,
                chunked,
            }
        };
        Ok(chunk)
    }
}
