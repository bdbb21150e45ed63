//! Generic register writer.
//!
//! Covers peripherals whose autonomous sequences are plain register updates
//! (comparator or op-amp reconfiguration, timer compare values, GPIO output
//! patterns) plus an optional stream from memory into one fixed register
//! (DAC output, compare value tables).

use core::marker::PhantomData;

use crate::error::{FactoryError, Result};
use crate::factory::{ChunkTransfer, ConfigNode, NodeFactory, fill_words};
use crate::node::{DataTransfer, Direction, Endpoint, Node};
use crate::transaction::TransferStep;

/// Identifier of data nodes; config nodes use their register address.
pub const STREAM_NODE_ID: u32 = u32::MAX;

/// Register update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterOp<'a> {
    /// Write one value
    Write {
        /// Register address
        register: u32,
        /// Value
        value: u32,
    },
    /// Write consecutive registers starting at `register`
    Block {
        /// First register address
        register: u32,
        /// Values
        values: &'a [u32],
    },
}

/// Factory writing registers and streaming to one data register
#[derive(Debug, Clone)]
pub struct RegisterWriter<'a> {
    data_register: Option<u32>,
    _ops: PhantomData<&'a [u32]>,
}

impl RegisterWriter<'_> {
    /// Writer for config-only queues
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data_register: None,
            _ops: PhantomData,
        }
    }

    /// Writer streaming data chunks to or from `register`
    #[must_use]
    pub const fn with_data_register(mut self, register: u32) -> Self {
        self.data_register = Some(register);
        self
    }
}

impl Default for RegisterWriter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> NodeFactory for RegisterWriter<'a> {
    type Op = RegisterOp<'a>;

    fn build_config(
        &mut self,
        op: &RegisterOp<'a>,
        _step: Option<&TransferStep>,
        words: &mut [u32],
    ) -> Result<ConfigNode> {
        let (register, used) = match *op {
            RegisterOp::Write { register, value } => (register, fill_words(words, &[value])?),
            RegisterOp::Block { register, values } => {
                if values.is_empty() {
                    return Err(FactoryError::InvalidParameter.into());
                }
                (register, fill_words(words, values)?)
            }
        };

        Ok(ConfigNode {
            id: register,
            register,
            words: used,
        })
    }

    fn build_data(&mut self, chunk: &ChunkTransfer) -> Result<Node> {
        let register = Endpoint::Register(self.data_register.ok_or(FactoryError::UnsupportedOperation)?);
        let memory = Endpoint::Memory(chunk.address);

        let (source, destination) = match chunk.direction {
            Direction::MemoryToPeripheral => (memory, register),
            Direction::PeripheralToMemory => (register, memory),
            Direction::MemoryToMemory | Direction::PeripheralToPeripheral => {
                return Err(FactoryError::UnsupportedOperation.into());
            }
        };
        Ok(Node::data(
            STREAM_NODE_ID,
            DataTransfer::new(source, destination, chunk.len, chunk.width),
        ))
    }
}
