//! Descriptor nodes.
//!
//! A [`Node`] is one autonomous hardware operation: either a register update
//! ([`NodeKind::Config`]) or a payload move ([`NodeKind::Data`]). Nodes carry no
//! link; the ordering relation lives in the storage link table and is owned by
//! the [`Queue`](crate::Queue) the node is appended to.
//!
//! Config node register words are held in the storage arena. The node only
//! records the [`WordSpan`] it owns.

pub mod transfer;
pub mod trigger;

pub use transfer::{
    DataConfigUpdate, DataTransfer, DataWidth, Direction, Endpoint, TransferConfig, TransferEvent,
};
pub use trigger::{TriggerConfig, TriggerMode, TriggerPolarity, TriggerTarget};

/// Index of a node slot inside a [`NodeStorage`](crate::NodeStorage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    /// Create an index from a raw slot number.
    #[must_use]
    pub const fn new(slot: usize) -> Self {
        Self(slot)
    }

    /// Raw slot number.
    #[inline(always)]
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

/// Node kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeKind {
    /// Register-field update, no payload movement
    Config,
    /// Payload transfer
    Data,
}

/// Contiguous range of register words in the storage arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WordSpan {
    pub(crate) start: usize,
    pub(crate) len: usize,
}

impl WordSpan {
    /// First word index.
    #[inline(always)]
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Number of words.
    #[inline(always)]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if the span covers no words.
    #[inline(always)]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// What a node does when the backend executes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Payload {
    /// Copy `words` from the arena to consecutive registers starting at `register`
    Config {
        /// Destination register address
        register: u32,
        /// Source words owned by this node
        words: WordSpan,
    },
    /// Move a payload block
    Data(DataTransfer),
}

/// One hardware descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Node {
    /// Factory-defined node identifier
    id: u32,
    payload: Payload,
    transfer: TransferConfig,
    trigger: Option<TriggerConfig>,
}

impl Node {
    /// Placeholder stored in slots that were never built.
    pub(crate) const EMPTY: Node = Node {
        id: 0,
        payload: Payload::Config {
            register: 0,
            words: WordSpan { start: 0, len: 0 },
        },
        transfer: TransferConfig::register_write(),
        trigger: None,
    };

    /// Create a data node moving `transfer`.
    ///
    /// Increments and widths are derived from the endpoints.
    #[must_use]
    pub const fn data(id: u32, transfer: DataTransfer) -> Self {
        Self {
            id,
            payload: Payload::Data(transfer),
            transfer: TransferConfig::for_data(&transfer),
            trigger: None,
        }
    }

    /// Create a config node writing `words` to `register`.
    pub(crate) const fn config(id: u32, register: u32, words: WordSpan) -> Self {
        Self {
            id,
            payload: Payload::Config { register, words },
            transfer: TransferConfig::register_write(),
            trigger: None,
        }
    }

    /// Replace the transfer configuration.
    #[must_use]
    pub const fn with_transfer(mut self, transfer: TransferConfig) -> Self {
        self.transfer = transfer;
        self
    }

    /// Attach a trigger condition.
    #[must_use]
    pub const fn with_trigger(mut self, trigger: TriggerConfig) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Node kind.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self.payload {
            Payload::Config { .. } => NodeKind::Config,
            Payload::Data(_) => NodeKind::Data,
        }
    }

    /// Factory-defined identifier.
    #[inline(always)]
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Payload description.
    #[inline(always)]
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Transfer configuration.
    #[inline(always)]
    #[must_use]
    pub const fn transfer(&self) -> &TransferConfig {
        &self.transfer
    }

    /// Trigger condition, if gated.
    #[inline(always)]
    #[must_use]
    pub const fn trigger(&self) -> Option<&TriggerConfig> {
        self.trigger.as_ref()
    }

    /// Data transfer, for data nodes.
    #[must_use]
    pub const fn data_transfer(&self) -> Option<&DataTransfer> {
        match &self.payload {
            Payload::Data(t) => Some(t),
            Payload::Config { .. } => None,
        }
    }

    /// Register words span, for config nodes.
    #[must_use]
    pub const fn words(&self) -> Option<WordSpan> {
        match self.payload {
            Payload::Config { words, .. } => Some(words),
            Payload::Data(_) => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
