//! Node factory seam.
//!
//! A [`NodeFactory`] knows one peripheral family's register layout and turns
//! semantic operations into nodes. The builder owns slots, register words and
//! linking; a factory only fills the words it is lent and describes the node.

use crate::error::{FactoryError, Result, StorageError};
use crate::node::{DataWidth, Direction, Node};
use crate::transaction::TransferStep;

/// Config node description returned by a factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigNode {
    /// Factory-defined node identifier
    pub id: u32,
    /// First register written
    pub register: u32,
    /// Words written at the front of the lent window
    pub words: usize,
}

/// Data chunk the builder asks a factory to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChunkTransfer {
    /// Position of the chunk
    pub step: TransferStep,
    /// Bus address of the chunk's first element in memory
    pub address: u32,
    /// Element count
    pub len: usize,
    /// Element width
    pub width: DataWidth,
    /// Direction relative to the peripheral
    pub direction: Direction,
}

/// Peripheral-specific node builder.
///
/// # Implementing
///
/// `build_config` writes its register values into the front of `words` and
/// reports how many it used. `words` is the unused tail of the storage arena;
/// a factory needing more words than lent returns
/// `StorageError::WordsExhausted` (see [`fill_words`]).
pub trait NodeFactory {
    /// Semantic operation understood by this factory
    type Op;

    /// Build a config node for `op`.
    ///
    /// `step` is the transfer position when the operation is part of a data
    /// transfer, `None` for config-only queues.
    fn build_config(
        &mut self,
        op: &Self::Op,
        step: Option<&TransferStep>,
        words: &mut [u32],
    ) -> Result<ConfigNode>;

    /// Build the data node moving `chunk`.
    fn build_data(&mut self, chunk: &ChunkTransfer) -> Result<Node> {
        let _ = chunk;
        Err(FactoryError::UnsupportedOperation.into())
    }
}

/// Copy `values` into the front of a lent word window.
///
/// Returns the number of words written.
///
/// # Errors
///
/// `StorageError::WordsExhausted` if the window is too small.
pub fn fill_words(words: &mut [u32], values: &[u32]) -> Result<usize> {
    let dst = words
        .get_mut(..values.len())
        .ok_or(StorageError::WordsExhausted)?;
    dst.copy_from_slice(values);
    Ok(values.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::transaction::{Chunk, FrameFlags};

    struct ConfigOnly;

    impl NodeFactory for ConfigOnly {
        type Op = u32;

        fn build_config(
            &mut self,
            op: &u32,
            _step: Option<&TransferStep>,
            words: &mut [u32],
        ) -> Result<ConfigNode> {
            Ok(ConfigNode {
                id: 0,
                register: 0x4000_0000,
                words: fill_words(words, &[*op])?,
            })
        }
    }

    #[test]
    fn fill_words_writes_prefix() {
        let mut window = [0u32; 4];
        assert_eq!(fill_words(&mut window, &[1, 2]), Ok(2));
        assert_eq!(window, [1, 2, 0, 0]);
    }

    #[test]
    fn fill_words_rejects_small_window() {
        let mut window = [0u32; 1];
        assert_eq!(
            fill_words(&mut window, &[1, 2]),
            Err(Error::Storage(StorageError::WordsExhausted))
        );
        assert_eq!(window, [0]);
    }

    #[test]
    fn default_build_data_is_unsupported() {
        let chunk = ChunkTransfer {
            step: TransferStep {
                chunk: Chunk::whole(1),
                frame: FrameFlags::single(),
            },
            address: 0x2000_0000,
            len: 1,
            width: DataWidth::Byte,
            direction: Direction::MemoryToPeripheral,
        };

        assert_eq!(
            ConfigOnly.build_data(&chunk),
            Err(Error::Factory(FactoryError::UnsupportedOperation))
        );
    }

    #[test]
    fn config_only_factory_fills_window() {
        let mut window = [0u32; 2];
        let node = ConfigOnly.build_config(&7, None, &mut window).unwrap();
        assert_eq!(node.words, 1);
        assert_eq!(window[0], 7);
    }
}
