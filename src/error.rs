//! Error types for the LPBAM queue compiler
//!
//! Errors are organized by domain for better diagnostics:
//! - [`TransferError`]: Malformed transfer requests (sizes, frame counts)
//! - [`QueueError`]: Queue linkage and modifier contract violations
//! - [`StorageError`]: Caller-provided node/register storage problems
//! - [`FactoryError`]: Failures reported by a [`NodeFactory`](crate::NodeFactory)
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most builder and queue methods.
//!
//! None of these conditions are transient. Every error is a caller contract
//! violation reported at the offending call, and the call has no effect.

// =============================================================================
// Transfer Errors
// =============================================================================

/// Transfer request errors
///
/// These errors occur when a builder call describes an impossible transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// Total requested size is zero or inconsistent with the in-flight chunk sequence
    InvalidSize,
    /// Per-node element ceiling is zero
    InvalidChunkSize,
    /// Frame count is zero
    InvalidFrameCount,
    /// Frame count changed while a sequence was in flight
    FrameCountMismatch,
}

impl core::fmt::Display for TransferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransferError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransferError::InvalidSize => "invalid transfer size",
            TransferError::InvalidChunkSize => "invalid chunk size",
            TransferError::InvalidFrameCount => "invalid frame count",
            TransferError::FrameCountMismatch => "frame count changed mid-sequence",
        }
    }
}

// =============================================================================
// Queue Errors
// =============================================================================

/// Queue linkage and modifier errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    /// Node slot is already linked into a queue
    AlreadyLinked,
    /// Queue is circular and can no longer be modified
    Frozen,
    /// Operation not supported on this node kind
    UnsupportedNode,
    /// Node does not belong to this queue
    NotInQueue,
    /// Queue has no nodes
    Empty,
}

impl core::fmt::Display for QueueError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl QueueError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            QueueError::AlreadyLinked => "node already linked",
            QueueError::Frozen => "queue is frozen",
            QueueError::UnsupportedNode => "unsupported node kind",
            QueueError::NotInQueue => "node not in queue",
            QueueError::Empty => "queue is empty",
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Node and register-word storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// No node slots left
    NodesExhausted,
    /// No register words left
    WordsExhausted,
    /// Slot index out of range or never built
    InvalidSlot,
    /// Every queue identifier was handed out
    QueuesExhausted,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StorageError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            StorageError::NodesExhausted => "node storage exhausted",
            StorageError::WordsExhausted => "register word storage exhausted",
            StorageError::InvalidSlot => "invalid node slot",
            StorageError::QueuesExhausted => "queue identifiers exhausted",
        }
    }
}

// =============================================================================
// Factory Errors
// =============================================================================

/// Errors reported by node factories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FactoryError {
    /// Operation is not supported by this peripheral
    UnsupportedOperation,
    /// Operation parameter out of range
    InvalidParameter,
}

impl core::fmt::Display for FactoryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FactoryError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            FactoryError::UnsupportedOperation => "unsupported operation",
            FactoryError::InvalidParameter => "invalid parameter",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Transfer(TransferError::InvalidSize)) => { /* ... */ }
///     Err(Error::Queue(QueueError::Frozen)) => { /* ... */ }
///     Err(Error::Storage(StorageError::NodesExhausted)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Transfer request error
    Transfer(TransferError),
    /// Queue error
    Queue(QueueError),
    /// Storage error
    Storage(StorageError),
    /// Node factory error
    Factory(FactoryError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Transfer(e) => write!(f, "transfer: {}", e.as_str()),
            Error::Queue(e) => write!(f, "queue: {}", e.as_str()),
            Error::Storage(e) => write!(f, "storage: {}", e.as_str()),
            Error::Factory(e) => write!(f, "factory: {}", e.as_str()),
        }
    }
}

// From impls for automatic conversion
impl From<TransferError> for Error {
    fn from(e: TransferError) -> Self {
        Error::Transfer(e)
    }
}

impl From<QueueError> for Error {
    fn from(e: QueueError) -> Self {
        Error::Queue(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Error::Storage(e)
    }
}

impl From<FactoryError> for Error {
    fn from(e: FactoryError) -> Self {
        Error::Factory(e)
    }
}

/// Result type alias for queue compiler operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for transfer planning
pub type TransferResult<T> = core::result::Result<T, TransferError>;

/// Result type alias for queue linkage
pub type QueueResult<T> = core::result::Result<T, QueueError>;

/// Result type alias for storage allocation
pub type StorageResult<T> = core::result::Result<T, StorageError>;

// =============================================================================
// Unit Tests
// =============================================================================
