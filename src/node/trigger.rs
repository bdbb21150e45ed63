//! Hardware trigger gating configuration.

use super::NodeIndex;

/// Which transfer granule a trigger hit releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerMode {
    /// A block transfer waits for a trigger hit
    #[default]
    Block,
    /// A repeated block transfer waits for a trigger hit
    RepeatedBlock,
    /// The link to the next node waits for a trigger hit
    LinkedItem,
    /// Each single/burst transfer waits for a trigger hit
    SingleBurst,
}

/// Trigger edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerPolarity {
    /// Trigger masked, node is never released by the event
    Masked,
    /// Rising edge
    #[default]
    Rising,
    /// Falling edge
    Falling,
}

/// Hardware-event condition attached to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TriggerConfig {
    /// Gated granule
    pub mode: TriggerMode,
    /// Edge
    pub polarity: TriggerPolarity,
    /// Backend-specific trigger source selector
    pub selection: u8,
}

impl TriggerConfig {
    /// Create a trigger configuration
    #[must_use]
    pub const fn new(mode: TriggerMode, polarity: TriggerPolarity, selection: u8) -> Self {
        Self {
            mode,
            polarity,
            selection,
        }
    }

    /// Set gated granule
    #[must_use]
    pub const fn with_mode(mut self, mode: TriggerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set edge
    #[must_use]
    pub const fn with_polarity(mut self, polarity: TriggerPolarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Set source selector
    #[must_use]
    pub const fn with_selection(mut self, selection: u8) -> Self {
        self.selection = selection;
        self
    }

    /// Whether a trigger hit can ever release the node
    #[must_use]
    pub const fn is_masked(&self) -> bool {
        matches!(self.polarity, TriggerPolarity::Masked)
    }
}

/// Where a trigger condition is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerTarget {
    /// The queue's first node, gating the whole queue start
    Queue,
    /// A specific data node of the queue
    Node(NodeIndex),
}
