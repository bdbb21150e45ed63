//! Caller-owned node and register-word arena.
//!
//! [`NodeStorage`] holds every node slot, every register word written by
//! config nodes, and the link table that orders nodes into queues. It is
//! const-constructible so it can live in a `static` placed in memory the
//! execution backend can reach.
//!
//! Slots and words are handed out by two bump cursors. Nothing is ever freed
//! individually; a failed builder call rewinds both cursors to a
//! [`StorageMark`] taken before staging started.

use crate::constants::REGISTER_WORD_SIZE;
use crate::error::{StorageError, StorageResult};
use crate::node::{Node, NodeIndex, WordSpan};
use crate::queue::{Queue, QueueId};

const _: () = assert!(core::mem::size_of::<u32>() == REGISTER_WORD_SIZE);

/// One node slot plus its link-table entry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Slot {
    pub(crate) node: Node,
    pub(crate) built: bool,
    pub(crate) owner: Option<QueueId>,
    pub(crate) next: Option<NodeIndex>,
}

impl Slot {
    const EMPTY: Slot = Slot {
        node: Node::EMPTY,
        built: false,
        owner: None,
        next: None,
    };
}

/// Allocation cursors captured before staging, used for rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StorageMark {
    slot: usize,
    word: usize,
}

/// Fixed-capacity arena of `NODES` node slots and `WORDS` register words.
///
/// # Example
///
/// ```ignore
/// static mut STORAGE: NodeStorage<32, 32> = NodeStorage::new();
/// ```
pub struct NodeStorage<const NODES: usize, const WORDS: usize> {
    slots: [Slot; NODES],
    words: [u32; WORDS],
    next_slot: usize,
    next_word: usize,
    next_queue: u16,
}

impl<const NODES: usize, const WORDS: usize> NodeStorage<NODES, WORDS> {
    /// Create an empty arena (const, suitable for static initialization).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [const { Slot::EMPTY }; NODES],
            words: [0; WORDS],
            next_slot: 0,
            next_word: 0,
            next_queue: 0,
        }
    }

    /// Create an empty queue with a fresh identifier.
    ///
    /// Identifiers are never reused, so one storage hands out at most
    /// `u16::MAX` queues.
    ///
    /// # Errors
    ///
    /// `StorageError::QueuesExhausted` once every identifier was used.
    pub fn new_queue(&mut self) -> StorageResult<Queue> {
        let id = QueueId(self.next_queue);
        self.next_queue = self
            .next_queue
            .checked_add(1)
            .ok_or(StorageError::QueuesExhausted)?;
        Ok(Queue::new(id))
    }

    /// Place a node in the next free slot, unlinked.
    ///
    /// The returned index can be handed to [`Queue::append`].
    ///
    /// # Errors
    ///
    /// `StorageError::NodesExhausted` if every slot is in use.
    pub fn push(&mut self, node: Node) -> StorageResult<NodeIndex> {
        let slot = self
            .slots
            .get_mut(self.next_slot)
            .ok_or(StorageError::NodesExhausted)?;
        *slot = Slot {
            node,
            built: true,
            owner: None,
            next: None,
        };
        let index = NodeIndex(self.next_slot);
        self.next_slot += 1;
        Ok(index)
    }

    /// Total node slots.
    #[inline(always)]
    #[must_use]
    pub const fn node_capacity(&self) -> usize {
        NODES
    }

    /// Total register words.
    #[inline(always)]
    #[must_use]
    pub const fn word_capacity(&self) -> usize {
        WORDS
    }

    /// Node slots not yet handed out.
    #[inline(always)]
    #[must_use]
    pub const fn free_nodes(&self) -> usize {
        NODES - self.next_slot
    }

    /// Register words not yet handed out.
    #[inline(always)]
    #[must_use]
    pub const fn free_words(&self) -> usize {
        WORDS - self.next_word
    }

    /// Built node at `index`.
    pub fn node(&self, index: NodeIndex) -> StorageResult<&Node> {
        self.slot(index).map(|slot| &slot.node)
    }

    /// Follow the link out of `index`.
    ///
    /// Returns the circular back-link for the tail of a circular queue, and
    /// `None` for the tail of a linear one.
    pub fn next(&self, index: NodeIndex) -> StorageResult<Option<NodeIndex>> {
        self.slot(index).map(|slot| slot.next)
    }

    /// Register words owned by a config node.
    pub fn words(&self, span: WordSpan) -> StorageResult<&[u32]> {
        self.words
            .get(span.start..span.start + span.len)
            .ok_or(StorageError::InvalidSlot)
    }

    /// Bus address of the node in slot `index`.
    pub fn node_address(&self, index: NodeIndex) -> StorageResult<u32> {
        self.slot(index)
            .map(|slot| core::ptr::from_ref(&slot.node) as usize as u32)
    }

    /// Bus address of the first word of `span`.
    pub fn words_address(&self, span: WordSpan) -> StorageResult<u32> {
        self.words(span)?;
        let base = self.words.as_ptr() as usize;
        Ok((base + span.start * REGISTER_WORD_SIZE) as u32)
    }

    // -------------------------------------------------------------------------
    // Staging (crate-internal)
    // -------------------------------------------------------------------------

    /// Capture the allocation cursors.
    pub(crate) const fn mark(&self) -> StorageMark {
        StorageMark {
            slot: self.next_slot,
            word: self.next_word,
        }
    }

    /// Discard everything staged since `mark`.
    pub(crate) fn rollback(&mut self, mark: StorageMark) {
        for slot in &mut self.slots[mark.slot..self.next_slot] {
            *slot = Slot::EMPTY;
        }
        for word in &mut self.words[mark.word..self.next_word] {
            *word = 0;
        }
        self.next_slot = mark.slot;
        self.next_word = mark.word;
    }

    /// Slots staged since `mark`, in staging order.
    pub(crate) fn staged_since(&self, mark: StorageMark) -> core::ops::Range<usize> {
        mark.slot..self.next_slot
    }

    /// Unused register words a factory may write into.
    pub(crate) fn word_window(&mut self) -> &mut [u32] {
        &mut self.words[self.next_word..]
    }

    /// Claim `used` words from the front of the window.
    pub(crate) fn commit_words(&mut self, used: usize) -> StorageResult<WordSpan> {
        if used > self.free_words() {
            return Err(StorageError::WordsExhausted);
        }
        let span = WordSpan {
            start: self.next_word,
            len: used,
        };
        self.next_word += used;
        Ok(span)
    }

    pub(crate) fn slot(&self, index: NodeIndex) -> StorageResult<&Slot> {
        self.slots
            .get(index.0)
            .filter(|slot| slot.built)
            .ok_or(StorageError::InvalidSlot)
    }

    pub(crate) fn slot_mut(&mut self, index: NodeIndex) -> StorageResult<&mut Slot> {
        self.slots
            .get_mut(index.0)
            .filter(|slot| slot.built)
            .ok_or(StorageError::InvalidSlot)
    }
}

impl<const NODES: usize, const WORDS: usize> Default for NodeStorage<NODES, WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

/// Storage sized with the crate defaults.
pub type DefaultNodeStorage = NodeStorage<
    { crate::constants::DEFAULT_NODE_SLOTS },
    { crate::constants::DEFAULT_REGISTER_WORDS },
>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{DataTransfer, DataWidth, Endpoint};

    fn data_node(id: u32) -> Node {
        Node::data(
            id,
            DataTransfer::new(
                Endpoint::Memory(0x2000_0000),
                Endpoint::Register(0x4000_0028),
                4,
                DataWidth::Byte,
            ),
        )
    }

    #[test]
    fn new_storage_is_empty() {
        let storage: NodeStorage<4, 8> = NodeStorage::new();
        assert_eq!(storage.node_capacity(), 4);
        assert_eq!(storage.word_capacity(), 8);
        assert_eq!(storage.free_nodes(), 4);
        assert_eq!(storage.free_words(), 8);
    }

    #[test]
    fn static_storage_is_const_constructible() {
        static STORAGE: NodeStorage<2, 2> = NodeStorage::new();
        assert_eq!(STORAGE.free_nodes(), 2);
    }

    #[test]
    fn push_hands_out_sequential_slots() {
        let mut storage: NodeStorage<2, 0> = NodeStorage::new();

        let a = storage.push(data_node(1)).unwrap();
        let b = storage.push(data_node(2)).unwrap();

        assert_eq!(a.get(), 0);
        assert_eq!(b.get(), 1);
        assert_eq!(storage.node(b).unwrap().id(), 2);
        assert_eq!(storage.free_nodes(), 0);
    }

    #[test]
    fn push_fails_when_slots_exhausted() {
        let mut storage: NodeStorage<1, 0> = NodeStorage::new();
        storage.push(data_node(1)).unwrap();

        assert_eq!(
            storage.push(data_node(2)),
            Err(StorageError::NodesExhausted)
        );
    }

    #[test]
    fn unbuilt_slot_is_invalid() {
        let storage: NodeStorage<4, 0> = NodeStorage::new();
        assert_eq!(
            storage.node(NodeIndex::new(0)).err(),
            Some(StorageError::InvalidSlot)
        );
        assert_eq!(
            storage.next(NodeIndex::new(9)).err(),
            Some(StorageError::InvalidSlot)
        );
    }

    #[test]
    fn commit_words_claims_window_prefix() {
        let mut storage: NodeStorage<1, 4> = NodeStorage::new();

        let window = storage.word_window();
        assert_eq!(window.len(), 4);
        window[0] = 0xAA;
        window[1] = 0xBB;

        let span = storage.commit_words(2).unwrap();
        assert_eq!(span, WordSpan { start: 0, len: 2 });
        assert_eq!(storage.words(span).unwrap(), &[0xAA, 0xBB]);
        assert_eq!(storage.word_window().len(), 2);
    }

    #[test]
    fn commit_words_rejects_overflow() {
        let mut storage: NodeStorage<1, 2> = NodeStorage::new();
        assert_eq!(storage.commit_words(3), Err(StorageError::WordsExhausted));
        assert_eq!(storage.free_words(), 2);
    }

    #[test]
    fn rollback_restores_cursors_and_clears_slots() {
        let mut storage: NodeStorage<4, 4> = NodeStorage::new();
        storage.push(data_node(1)).unwrap();
        let mark = storage.mark();

        storage.word_window()[0] = 0x55;
        storage.commit_words(1).unwrap();
        let staged = storage.push(data_node(2)).unwrap();

        storage.rollback(mark);

        assert_eq!(storage.free_nodes(), 3);
        assert_eq!(storage.free_words(), 4);
        assert_eq!(storage.node(staged).err(), Some(StorageError::InvalidSlot));
        assert_eq!(storage.word_window()[0], 0);
    }

    #[test]
    fn new_queue_ids_are_unique() {
        let mut storage: NodeStorage<1, 1> = NodeStorage::new();
        let a = storage.new_queue().unwrap();
        let b = storage.new_queue().unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn queue_ids_are_never_reused() {
        let mut storage: NodeStorage<1, 1> = NodeStorage::new();
        storage.next_queue = u16::MAX - 1;

        let last = storage.new_queue().unwrap();
        assert_eq!(last.id(), QueueId(u16::MAX - 1));
        assert_eq!(storage.new_queue().err(), Some(StorageError::QueuesExhausted));
        assert_eq!(storage.new_queue().err(), Some(StorageError::QueuesExhausted));
    }

    #[test]
    fn node_addresses_follow_slot_order() {
        let mut storage: NodeStorage<2, 0> = NodeStorage::new();
        let a = storage.push(data_node(1)).unwrap();
        let b = storage.push(data_node(2)).unwrap();

        let addr_a = storage.node_address(a).unwrap();
        let addr_b = storage.node_address(b).unwrap();
        assert_eq!(
            addr_b.wrapping_sub(addr_a) as usize,
            core::mem::size_of::<Slot>()
        );
    }

    #[test]
    fn words_addresses_follow_word_order() {
        let mut storage: NodeStorage<1, 4> = NodeStorage::new();
        let first = storage.commit_words(1).unwrap();
        let second = storage.commit_words(2).unwrap();

        let addr_first = storage.words_address(first).unwrap();
        let addr_second = storage.words_address(second).unwrap();
        assert_eq!(
            addr_second.wrapping_sub(addr_first) as usize,
            REGISTER_WORD_SIZE
        );
        assert_eq!(
            addr_first,
            storage.words(first).unwrap().as_ptr() as usize as u32
        );
    }

    #[test]
    fn words_address_of_foreign_span_fails() {
        let storage: NodeStorage<1, 2> = NodeStorage::new();
        let span = WordSpan { start: 1, len: 4 };
        assert_eq!(storage.words_address(span), Err(StorageError::InvalidSlot));
    }
}
