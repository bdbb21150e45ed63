//! I2C master node factory.
//!
//! Emits the nodes of an autonomous I2C master transfer: peripheral
//! disable/enable, bus timing, autonomous trigger, one transaction control
//! word per chunk, and the data node moving bytes to or from the data
//! registers.
//!
//! # Transaction control word
//!
//! | flag | rule |
//! |---|---|
//! | START | first chunk only, and not on the first frame of a triggered sequence |
//! | RELOAD | every chunk but the last of a frame |
//! | AUTOEND | last chunk of the transaction, unless software end is requested |
//! | NBYTES | chunk length |
//!
//! # Example
//!
//! ```ignore
//! const SETUP: &[I2cOp] = &[I2cOp::Disable, I2cOp::Timing(0x3042_0F13), I2cOp::Enable];
//! const CHUNK: &[I2cOp] = &[I2cOp::Transaction];
//!
//! let config = I2cMasterConfig::new(I2C3_BASE, 0x50).with_mode(I2cMode::Transmit);
//! let mut builder = QueueBuilder::new(I2cMasterFactory::new(config));
//! let mut txn = Transaction::new(I2C_MAX_TRANSFER_SIZE)?;
//!
//! let request = TransferRequest::new(MemoryRegion::new(buf, DataWidth::Byte), 400, Direction::MemoryToPeripheral)
//!     .with_setup(SETUP)
//!     .with_per_chunk(CHUNK);
//! builder.build_full(&mut storage, &mut queue, &mut txn, &request)?;
//! builder.build_full(&mut storage, &mut queue, &mut txn, &request)?;
//! ```

use crate::constants::I2C_MAX_TRANSFER_SIZE;
use crate::error::{FactoryError, Result};
use crate::factory::{ChunkTransfer, ConfigNode, NodeFactory, fill_words};
use crate::node::{DataTransfer, DataWidth, Direction, Endpoint, Node, TriggerConfig, TriggerPolarity};
use crate::transaction::TransferStep;

// =============================================================================
// Register Model
// =============================================================================

/// Register offsets from the instance base
pub mod regs {
    /// Control register 1 (enable, DMA requests)
    pub const CR1: u32 = 0x00;
    /// Control register 2 (transaction control word)
    pub const CR2: u32 = 0x04;
    /// Bus timing
    pub const TIMINGR: u32 = 0x10;
    /// Receive data
    pub const RXDR: u32 = 0x24;
    /// Transmit data
    pub const TXDR: u32 = 0x28;
    /// Autonomous mode control
    pub const AUTOCR: u32 = 0x2C;
}

/// CR1 fields
pub mod cr1 {
    /// Peripheral enable
    pub const PE: u32 = 1 << 0;
    /// TX DMA requests
    pub const TXDMAEN: u32 = 1 << 14;
    /// RX DMA requests
    pub const RXDMAEN: u32 = 1 << 15;
}

/// Transaction control word fields
pub mod control {
    /// Byte count
    pub const NBYTES_MASK: u32 = 0xFF;
    /// Generate a start condition
    pub const START: u32 = 1 << 8;
    /// More chunks follow in this frame
    pub const RELOAD: u32 = 1 << 9;
    /// Stop automatically after the byte count
    pub const AUTOEND: u32 = 1 << 10;
    /// Read transfer
    pub const READ: u32 = 1 << 11;
    /// Target address position (7 or 10 bits)
    pub const ADDRESS_SHIFT: u32 = 16;
    /// Target address mask
    pub const ADDRESS_MASK: u32 = 0x3FF;
}

/// AUTOCR fields
pub mod autocr {
    /// Trigger selection position
    pub const TRIGSEL_SHIFT: u32 = 16;
    /// Trigger selection mask
    pub const TRIGSEL_MASK: u32 = 0xF;
    /// Falling edge
    pub const TRIGPOL: u32 = 1 << 20;
    /// Trigger enabled
    pub const TRIGEN: u32 = 1 << 21;
}

/// Node identifiers
pub mod node_id {
    /// Peripheral disable
    pub const DISABLE: u32 = 0;
    /// Bus timing
    pub const TIMING: u32 = 1;
    /// Autonomous trigger
    pub const TRIGGER: u32 = 2;
    /// Peripheral enable
    pub const ENABLE: u32 = 3;
    /// Transaction control word
    pub const TRANSACTION: u32 = 4;
    /// Transmit data
    pub const TRANSMIT: u32 = 5;
    /// Receive data
    pub const RECEIVE: u32 = 6;
}

// =============================================================================
// Configuration
// =============================================================================

/// Master transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cMode {
    /// Master transmitter
    #[default]
    Transmit,
    /// Master receiver
    Receive,
}

impl I2cMode {
    const fn direction(self) -> Direction {
        match self {
            I2cMode::Transmit => Direction::MemoryToPeripheral,
            I2cMode::Receive => Direction::PeripheralToMemory,
        }
    }
}

/// I2C master factory configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cMasterConfig {
    /// Register block base address
    pub base: u32,
    /// Target device address
    pub device_address: u16,
    /// Transfer direction
    pub mode: I2cMode,
    /// Hardware trigger starting the transfer, if autonomous
    pub trigger: Option<TriggerConfig>,
    /// Leave the stop condition to software on the last chunk
    pub software_end: bool,
}

impl I2cMasterConfig {
    /// Transmit configuration for `device_address` on the instance at `base`
    #[must_use]
    pub const fn new(base: u32, device_address: u16) -> Self {
        Self {
            base,
            device_address,
            mode: I2cMode::Transmit,
            trigger: None,
            software_end: false,
        }
    }

    /// Set transfer direction
    #[must_use]
    pub const fn with_mode(mut self, mode: I2cMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set autonomous trigger
    #[must_use]
    pub const fn with_trigger(mut self, trigger: TriggerConfig) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Set software end mode
    #[must_use]
    pub const fn with_software_end(mut self, software_end: bool) -> Self {
        self.software_end = software_end;
        self
    }

    const fn is_triggered(&self) -> bool {
        match self.trigger {
            Some(trigger) => !trigger.is_masked(),
            None => false,
        }
    }
}

/// Semantic I2C operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cOp {
    /// Clear the peripheral enable
    Disable,
    /// Program bus timing with a precomputed value
    Timing(u32),
    /// Program the autonomous trigger from the configuration
    AutonomousTrigger,
    /// Set the peripheral enable and DMA requests
    Enable,
    /// Program the transaction control word of the current chunk
    Transaction,
}

// =============================================================================
// Control Flags
// =============================================================================

/// Symbolic transaction control word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlFlags {
    /// Generate a start condition
    pub start: bool,
    /// More chunks follow in this frame
    pub reload: bool,
    /// Stop automatically after this chunk
    pub autoend: bool,
    /// Read transfer
    pub read: bool,
    /// Byte count of this chunk
    pub nbytes: u8,
}

impl ControlFlags {
    /// Derive the control word of `step` for `config`.
    ///
    /// # Errors
    ///
    /// `FactoryError::InvalidParameter` if the chunk exceeds the byte counter.
    pub fn for_step(step: &TransferStep, config: &I2cMasterConfig) -> Result<Self> {
        if step.len() > I2C_MAX_TRANSFER_SIZE {
            return Err(FactoryError::InvalidParameter.into());
        }
        let nbytes = step.len() as u8;

        let chunk = &step.chunk;
        let frame = &step.frame;

        let triggered_start = frame.sequential && frame.first && config.is_triggered();
        let start = chunk.first && !triggered_start;
        let reload = !chunk.last;
        let autoend = chunk.last && step.needs_teardown() && !config.software_end;

        Ok(Self {
            start,
            reload,
            autoend,
            read: matches!(config.mode, I2cMode::Receive),
            nbytes,
        })
    }

    /// Pack into a control word addressed to `device_address`.
    #[must_use]
    pub const fn encode(&self, device_address: u16) -> u32 {
        let mut word = self.nbytes as u32 & control::NBYTES_MASK;
        if self.start {
            word |= control::START;
        }
        if self.reload {
            word |= control::RELOAD;
        }
        if self.autoend {
            word |= control::AUTOEND;
        }
        if self.read {
            word |= control::READ;
        }
        word | ((device_address as u32 & control::ADDRESS_MASK) << control::ADDRESS_SHIFT)
    }
}

// =============================================================================
// Factory
// =============================================================================

/// Node factory for an I2C master
#[derive(Debug, Clone)]
pub struct I2cMasterFactory {
    config: I2cMasterConfig,
}

impl I2cMasterFactory {
    /// Create a factory
    #[must_use]
    pub const fn new(config: I2cMasterConfig) -> Self {
        Self { config }
    }

    /// Current configuration
    #[must_use]
    pub const fn config(&self) -> &I2cMasterConfig {
        &self.config
    }

    /// Replace the configuration between transfers
    pub fn set_config(&mut self, config: I2cMasterConfig) {
        self.config = config;
    }

    const fn register(&self, offset: u32) -> u32 {
        self.config.base + offset
    }

    fn trigger_word(&self) -> Result<u32> {
        let trigger = self.config.trigger.ok_or(FactoryError::InvalidParameter)?;
        let selection = trigger.selection as u32;
        if selection > autocr::TRIGSEL_MASK {
            return Err(FactoryError::InvalidParameter.into());
        }

        let mut word = selection << autocr::TRIGSEL_SHIFT;
        match trigger.polarity {
            TriggerPolarity::Masked => return Ok(word),
            TriggerPolarity::Rising => {}
            TriggerPolarity::Falling => word |= autocr::TRIGPOL,
        }
        Ok(word | autocr::TRIGEN)
    }
}

impl NodeFactory for I2cMasterFactory {
    type Op = I2cOp;

    fn build_config(
        &mut self,
        op: &I2cOp,
        step: Option<&TransferStep>,
        words: &mut [u32],
    ) -> Result<ConfigNode> {
        let (id, offset, value) = match *op {
            I2cOp::Disable => (node_id::DISABLE, regs::CR1, 0),
            I2cOp::Timing(timing) => (node_id::TIMING, regs::TIMINGR, timing),
            I2cOp::AutonomousTrigger => (node_id::TRIGGER, regs::AUTOCR, self.trigger_word()?),
            I2cOp::Enable => (
                node_id::ENABLE,
                regs::CR1,
                cr1::PE | cr1::TXDMAEN | cr1::RXDMAEN,
            ),
            I2cOp::Transaction => {
                let step = step.ok_or(FactoryError::InvalidParameter)?;
                let flags = ControlFlags::for_step(step, &self.config)?;
                (
                    node_id::TRANSACTION,
                    regs::CR2,
                    flags.encode(self.config.device_address),
                )
            }
        };

        Ok(ConfigNode {
            id,
            register: self.register(offset),
            words: fill_words(words, &[value])?,
        })
    }

    fn build_data(&mut self, chunk: &ChunkTransfer) -> Result<Node> {
        if chunk.width != DataWidth::Byte {
            return Err(FactoryError::InvalidParameter.into());
        }
        if chunk.direction != self.config.mode.direction() {
            return Err(FactoryError::UnsupportedOperation.into());
        }

        let memory = Endpoint::Memory(chunk.address);
        let (id, source, destination) = match self.config.mode {
            I2cMode::Transmit => (
                node_id::TRANSMIT,
                memory,
                Endpoint::Register(self.register(regs::TXDR)),
            ),
            I2cMode::Receive => (
                node_id::RECEIVE,
                Endpoint::Register(self.register(regs::RXDR)),
                memory,
            ),
        };
        Ok(Node::data(
            id,
            DataTransfer::new(source, destination, chunk.len, DataWidth::Byte),
        ))
    }
}

// =============================================================================
// Tests
// =============================================================================
