//! Centralized Constants
//!
//! Single source of truth for the limits and defaults used by the queue
//! compiler and the bundled reference factories.
//!
//! # Organization
//!
//! - **Chunk ceilings**: maximum element count one data node can move
//! - **Sequencing**: frame counter defaults
//! - **Storage**: default arena sizes
//!
//! Register layouts are not described here; they belong to node factories.

// =============================================================================
// Chunk Ceilings
// =============================================================================

/// Maximum bytes an I2C transaction node can address (NBYTES is 8 bits)
pub const I2C_MAX_TRANSFER_SIZE: usize = 255;

/// Maximum elements a single DMA block can move (16-bit block counter)
pub const DMA_MAX_BLOCK_SIZE: usize = 0xFFFF;

// =============================================================================
// Sequencing
// =============================================================================

/// Frame count of a transfer with sequencing disabled
pub const SINGLE_FRAME: usize = 1;

/// First value of the 1-based frame counter
pub const FIRST_FRAME_INDEX: usize = 1;

// =============================================================================
// Default Storage Sizes
// =============================================================================

/// Default number of node slots in a [`NodeStorage`](crate::NodeStorage)
pub const DEFAULT_NODE_SLOTS: usize = 32;

/// Default number of register words in a [`NodeStorage`](crate::NodeStorage)
pub const DEFAULT_REGISTER_WORDS: usize = 32;

/// Size of one register word in bytes
pub const REGISTER_WORD_SIZE: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i2c_ceiling_fits_dma_block() {
        assert!(I2C_MAX_TRANSFER_SIZE < DMA_MAX_BLOCK_SIZE);
    }

    #[test]
    fn frame_counter_starts_at_one() {
        assert_eq!(FIRST_FRAME_INDEX, SINGLE_FRAME);
    }
}
