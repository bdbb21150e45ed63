//! ISR-safe node storage wrapper using critical sections.

use super::primitives::CriticalSectionCell;
use crate::error::{Result, StorageResult};
use crate::queue::Queue;
use crate::storage::NodeStorage;

/// ISR-safe [`NodeStorage`] wrapper.
///
/// All access goes through `critical_section::with()`, disabling interrupts
/// for the duration of the closure. Building a queue and reading its head
/// address inside one closure hands the backend a fully linked list.
///
/// # Example
///
/// ```ignore
/// static STORAGE: SharedStorage<32, 32> = SharedStorage::new();
///
/// let head = STORAGE.with(|storage| {
///     builder.build_full(storage, &mut queue, &mut txn, &request)?;
///     queue.head_address(storage)
/// })?;
/// ```
pub struct SharedStorage<const NODES: usize, const WORDS: usize> {
    inner: CriticalSectionCell<NodeStorage<NODES, WORDS>>,
}

impl<const NODES: usize, const WORDS: usize> SharedStorage<NODES, WORDS> {
    /// Create empty shared storage (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(NodeStorage::new()),
        }
    }

    /// Execute a closure with exclusive access to the storage.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut NodeStorage<NODES, WORDS>) -> R,
    {
        self.inner.with(f)
    }

    /// Try to execute a closure, returning `None` if already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut NodeStorage<NODES, WORDS>) -> R,
    {
        self.inner.try_with(f)
    }

    /// Create an empty queue in the shared storage.
    ///
    /// # Errors
    ///
    /// `StorageError::QueuesExhausted` once every identifier was used.
    pub fn new_queue(&self) -> StorageResult<Queue> {
        self.with(NodeStorage::new_queue)
    }

    /// Head address of `queue`, read inside a critical section.
    pub fn head_address(&self, queue: &Queue) -> Result<u32> {
        self.inner.with_ref(|storage| queue.head_address(storage))
    }
}

impl<const NODES: usize, const WORDS: usize> Default for SharedStorage<NODES, WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared storage sized for a single small transfer
pub type SharedStorageSmall = SharedStorage<8, 8>;

/// Shared storage with the crate default sizes
pub type SharedStorageDefault = SharedStorage<
    { crate::constants::DEFAULT_NODE_SLOTS },
    { crate::constants::DEFAULT_REGISTER_WORDS },
>;
