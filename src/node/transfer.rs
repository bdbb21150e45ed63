//! Data transfer description and per-node transfer configuration.

/// Element width of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataWidth {
    /// 8-bit elements
    #[default]
    Byte = 1,
    /// 16-bit elements
    HalfWord = 2,
    /// 32-bit elements
    Word = 4,
}

impl DataWidth {
    /// Element size in bytes
    #[must_use]
    pub const fn bytes(self) -> usize {
        self as usize
    }
}

/// One side of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Endpoint {
    /// Incrementing memory buffer at this bus address
    Memory(u32),
    /// Fixed peripheral register at this bus address
    Register(u32),
}

impl Endpoint {
    /// Bus address
    #[must_use]
    pub const fn address(&self) -> u32 {
        match *self {
            Endpoint::Memory(a) | Endpoint::Register(a) => a,
        }
    }

    /// Whether the address advances per element
    #[must_use]
    pub const fn increments(&self) -> bool {
        matches!(self, Endpoint::Memory(_))
    }
}

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Memory to peripheral (transmit)
    MemoryToPeripheral,
    /// Peripheral to memory (receive)
    PeripheralToMemory,
    /// Memory to memory
    MemoryToMemory,
    /// Peripheral to peripheral
    PeripheralToPeripheral,
}

/// Payload move carried by a data node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataTransfer {
    source: Endpoint,
    destination: Endpoint,
    count: usize,
    width: DataWidth,
}

impl DataTransfer {
    /// Describe a move of `count` elements of `width`.
    #[must_use]
    pub const fn new(source: Endpoint, destination: Endpoint, count: usize, width: DataWidth) -> Self {
        Self {
            source,
            destination,
            count,
            width,
        }
    }

    /// Source endpoint
    #[inline(always)]
    #[must_use]
    pub const fn source(&self) -> Endpoint {
        self.source
    }

    /// Destination endpoint
    #[inline(always)]
    #[must_use]
    pub const fn destination(&self) -> Endpoint {
        self.destination
    }

    /// Element count
    #[inline(always)]
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Element width
    #[inline(always)]
    #[must_use]
    pub const fn width(&self) -> DataWidth {
        self.width
    }

    /// Block size in bytes
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.count * self.width.bytes()
    }

    /// Direction derived from the endpoints
    #[must_use]
    pub const fn direction(&self) -> Direction {
        match (self.source, self.destination) {
            (Endpoint::Memory(_), Endpoint::Register(_)) => Direction::MemoryToPeripheral,
            (Endpoint::Register(_), Endpoint::Memory(_)) => Direction::PeripheralToMemory,
            (Endpoint::Memory(_), Endpoint::Memory(_)) => Direction::MemoryToMemory,
            (Endpoint::Register(_), Endpoint::Register(_)) => Direction::PeripheralToPeripheral,
        }
    }
}

/// When the backend raises its transfer-complete event for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferEvent {
    /// At the end of each block
    #[default]
    Block,
    /// At the end of each repeated block
    RepeatedBlock,
    /// At the end of each linked-list item
    EachLinkedItem,
    /// At the end of the last linked-list item
    LastLinkedItem,
}

/// Per-node transfer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferConfig {
    /// Source address increments per element
    pub source_increment: bool,
    /// Destination address increments per element
    pub destination_increment: bool,
    /// Source element width
    pub source_width: DataWidth,
    /// Destination element width
    pub destination_width: DataWidth,
    /// Transfer-complete event mode
    pub event: TransferEvent,
}

impl TransferConfig {
    /// Configuration of a config node: word-wide copy from the arena into registers.
    #[must_use]
    pub const fn register_write() -> Self {
        Self {
            source_increment: true,
            destination_increment: true,
            source_width: DataWidth::Word,
            destination_width: DataWidth::Word,
            event: TransferEvent::Block,
        }
    }

    /// Configuration matching a data transfer's endpoints and width.
    #[must_use]
    pub const fn for_data(transfer: &DataTransfer) -> Self {
        Self {
            source_increment: transfer.source.increments(),
            destination_increment: transfer.destination.increments(),
            source_width: transfer.width,
            destination_width: transfer.width,
            event: TransferEvent::Block,
        }
    }

    /// Apply a selective update.
    #[must_use]
    pub const fn apply(mut self, update: &DataConfigUpdate) -> Self {
        if let Some(v) = update.source_increment {
            self.source_increment = v;
        }
        if let Some(v) = update.destination_increment {
            self.destination_increment = v;
        }
        if let Some(v) = update.source_width {
            self.source_width = v;
        }
        if let Some(v) = update.destination_width {
            self.destination_width = v;
        }
        if let Some(v) = update.event {
            self.event = v;
        }
        self
    }
}

/// Selective update of a data node's transfer configuration.
///
/// Fields left as `None` keep the node's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataConfigUpdate {
    /// New source increment
    pub source_increment: Option<bool>,
    /// New destination increment
    pub destination_increment: Option<bool>,
    /// New source width
    pub source_width: Option<DataWidth>,
    /// New destination width
    pub destination_width: Option<DataWidth>,
    /// New event mode
    pub event: Option<TransferEvent>,
}

impl DataConfigUpdate {
    /// Update that changes nothing
    #[must_use]
    pub const fn new() -> Self {
        Self {
            source_increment: None,
            destination_increment: None,
            source_width: None,
            destination_width: None,
            event: None,
        }
    }

    /// Set source increment
    #[must_use]
    pub const fn with_source_increment(mut self, increment: bool) -> Self {
        self.source_increment = Some(increment);
        self
    }

    /// Set destination increment
    #[must_use]
    pub const fn with_destination_increment(mut self, increment: bool) -> Self {
        self.destination_increment = Some(increment);
        self
    }

    /// Set source width
    #[must_use]
    pub const fn with_source_width(mut self, width: DataWidth) -> Self {
        self.source_width = Some(width);
        self
    }

    /// Set destination width
    #[must_use]
    pub const fn with_destination_width(mut self, width: DataWidth) -> Self {
        self.destination_width = Some(width);
        self
    }

    /// Set event mode
    #[must_use]
    pub const fn with_event(mut self, event: TransferEvent) -> Self {
        self.event = Some(event);
        self
    }
}
