//! Testing utilities and mock implementations
//!
//! Provides a recording [`NodeFactory`] so the builder can be exercised on the
//! host without a peripheral register model.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use std::vec::Vec;

use crate::error::{FactoryError, Result};
use crate::factory::{ChunkTransfer, ConfigNode, NodeFactory, fill_words};
use crate::node::{DataTransfer, Direction, Endpoint, Node};
use crate::transaction::TransferStep;

/// Register the mock peripheral's data node reads or writes
pub const MOCK_DATA_REGISTER: u32 = 0x4000_1028;

/// Base of the mock peripheral's config registers
pub const MOCK_CONFIG_BASE: u32 = 0x4000_1000;

/// Identifier of data nodes built by [`MockFactory`]
pub const MOCK_DATA_ID: u32 = 0xDA7A;

// =============================================================================
// Mock Factory
// =============================================================================

/// Semantic operation understood by [`MockFactory`]
///
/// Writes `words` copies of `id` starting at `MOCK_CONFIG_BASE + id * 4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockOp {
    pub id: u32,
    pub words: usize,
}

impl MockOp {
    pub const fn new(id: u32) -> Self {
        Self { id, words: 1 }
    }

    pub const fn wide(id: u32, words: usize) -> Self {
        Self { id, words }
    }
}

/// Node factory recording every call, with failure injection
///
/// # Example
///
/// ```ignore
/// let mut builder = QueueBuilder::new(MockFactory::new());
/// builder.factory_mut().fail_config_on(2);
/// ```
#[derive(Debug, Default)]
pub struct MockFactory {
    /// Config calls: (op id, step)
    config_log: Vec<(u32, Option<TransferStep>)>,
    /// Data calls
    data_log: Vec<ChunkTransfer>,
    /// Op id whose config build fails
    fail_config_id: Option<u32>,
    /// Data builds fail
    fail_data: bool,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the config build of op `id`
    pub fn fail_config_on(&mut self, id: u32) {
        self.fail_config_id = Some(id);
    }

    /// Fail every data build
    pub fn fail_data(&mut self, fail: bool) {
        self.fail_data = fail;
    }

    /// Stop injecting failures
    pub fn heal(&mut self) {
        self.fail_config_id = None;
        self.fail_data = false;
    }

    pub fn config_calls(&self) -> &[(u32, Option<TransferStep>)] {
        &self.config_log
    }

    pub fn data_calls(&self) -> &[ChunkTransfer] {
        &self.data_log
    }

    pub fn clear(&mut self) {
        self.config_log.clear();
        self.data_log.clear();
    }
}

impl NodeFactory for MockFactory {
    type Op = MockOp;

    fn build_config(
        &mut self,
        op: &MockOp,
        step: Option<&TransferStep>,
        words: &mut [u32],
    ) -> Result<ConfigNode> {
        self.config_log.push((op.id, step.copied()));
        if self.fail_config_id == Some(op.id) {
            return Err(FactoryError::InvalidParameter.into());
        }

        let values: Vec<u32> = core::iter::repeat_n(op.id, op.words).collect();
        Ok(ConfigNode {
            id: op.id,
            register: MOCK_CONFIG_BASE + op.id * 4,
            words: fill_words(words, &values)?,
        })
    }

    fn build_data(&mut self, chunk: &ChunkTransfer) -> Result<Node> {
        self.data_log.push(*chunk);
        if self.fail_data {
            return Err(FactoryError::UnsupportedOperation.into());
        }

        let memory = Endpoint::Memory(chunk.address);
        let register = Endpoint::Register(MOCK_DATA_REGISTER);
        let (source, destination) = match chunk.direction {
            Direction::PeripheralToMemory => (register, memory),
            _ => (memory, register),
        };
        Ok(Node::data(
            MOCK_DATA_ID,
            DataTransfer::new(source, destination, chunk.len, chunk.width),
        ))
    }
}
