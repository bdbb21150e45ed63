//! Append-only node queues and their post-build modifiers.
//!
//! A [`Queue`] owns the links between nodes, never the nodes themselves. Node
//! memory stays in the [`NodeStorage`] the queue was created from, and every
//! queue method takes that storage explicitly.
//!
//! Nodes are only ever appended at the tail. Once [`Queue::set_circular`] has
//! closed the list into a ring the queue is frozen: appends and modifiers are
//! rejected with [`QueueError::Frozen`].
//!
//! Modifiers never edit a node field in place. They read the node, derive the
//! new configuration, and store the rebuilt node in the same slot.

#[cfg(feature = "log")]
use log::{info, warn};

use crate::error::{QueueError, Result};
use crate::node::{
    DataConfigUpdate, Node, NodeIndex, NodeKind, TransferEvent, TriggerConfig, TriggerTarget,
};
use crate::storage::NodeStorage;

/// Identifier assigned to a queue by its storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueId(pub(crate) u16);

/// Ordered, append-only list of nodes held in a [`NodeStorage`].
#[derive(Debug)]
pub struct Queue {
    id: QueueId,
    head: Option<NodeIndex>,
    tail: Option<NodeIndex>,
    len: usize,
    circular_entry: Option<NodeIndex>,
    frozen: bool,
}

impl Queue {
    pub(crate) const fn new(id: QueueId) -> Self {
        Self {
            id,
            head: None,
            tail: None,
            len: 0,
            circular_entry: None,
            frozen: false,
        }
    }

    /// Queue identifier
    #[inline(always)]
    #[must_use]
    pub const fn id(&self) -> QueueId {
        self.id
    }

    /// First node
    #[inline(always)]
    #[must_use]
    pub const fn head(&self) -> Option<NodeIndex> {
        self.head
    }

    /// Last appended node
    #[inline(always)]
    #[must_use]
    pub const fn tail(&self) -> Option<NodeIndex> {
        self.tail
    }

    /// Number of nodes
    #[inline(always)]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if no node was appended
    #[inline(always)]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if the queue was circularized
    #[inline(always)]
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Re-entry node of a circular queue
    #[inline(always)]
    #[must_use]
    pub const fn circular_entry(&self) -> Option<NodeIndex> {
        self.circular_entry
    }

    /// Bus address of the head node, as handed to the execution backend.
    ///
    /// Returns `Err(QueueError::Empty)` for an empty queue.
    pub fn head_address<const N: usize, const W: usize>(
        &self,
        storage: &NodeStorage<N, W>,
    ) -> Result<u32> {
        let head = self.head.ok_or(QueueError::Empty)?;
        Ok(storage.node_address(head)?)
    }

    /// Check whether `index` was appended to this queue.
    pub fn contains<const N: usize, const W: usize>(
        &self,
        storage: &NodeStorage<N, W>,
        index: NodeIndex,
    ) -> bool {
        storage
            .slot(index)
            .is_ok_and(|slot| slot.owner == Some(self.id))
    }

    /// Walk the queue once, head to tail.
    ///
    /// The circular back-link is not followed; use [`NodeStorage::next`] to
    /// walk the ring the way a backend does.
    pub fn iter<'a, const N: usize, const W: usize>(
        &self,
        storage: &'a NodeStorage<N, W>,
    ) -> QueueIter<'a, N, W> {
        QueueIter {
            storage,
            next: self.head,
            remaining: self.len,
        }
    }

    /// Append a built node at the tail.
    ///
    /// Nodes come from [`NodeStorage::push`] or from a builder call, which
    /// appends its own nodes.
    ///
    /// # Errors
    ///
    /// - `QueueError::Frozen` if the queue was circularized
    /// - `StorageError::InvalidSlot` if the slot was never built
    /// - `QueueError::AlreadyLinked` if the node belongs to any queue
    pub fn append<const N: usize, const W: usize>(
        &mut self,
        storage: &mut NodeStorage<N, W>,
        index: NodeIndex,
    ) -> Result<()> {
        if self.frozen {
            #[cfg(feature = "defmt")]
            defmt::warn!("append to frozen queue {} rejected", self.id);
            #[cfg(feature = "log")]
            warn!("append to frozen queue {:?} rejected", self.id);
            return Err(QueueError::Frozen.into());
        }
        if storage.slot(index)?.owner.is_some() {
            #[cfg(feature = "defmt")]
            defmt::warn!("node {} already linked", index);
            #[cfg(feature = "log")]
            warn!("node {index:?} already linked");
            return Err(QueueError::AlreadyLinked.into());
        }

        if let Some(tail) = self.tail {
            storage.slot_mut(tail)?.next = Some(index);
        } else {
            self.head = Some(index);
        }
        storage.slot_mut(index)?.owner = Some(self.id);
        self.tail = Some(index);
        self.len += 1;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Modifiers
    // -------------------------------------------------------------------------

    /// Gate the queue start or one data node on a hardware trigger.
    ///
    /// [`TriggerTarget::Queue`] gates the head node whatever its kind.
    /// [`TriggerTarget::Node`] must name a data node of this queue.
    ///
    /// # Errors
    ///
    /// - `QueueError::Frozen` if the queue was circularized
    /// - `QueueError::Empty` for a queue target on an empty queue
    /// - `QueueError::NotInQueue` if the node belongs elsewhere
    /// - `QueueError::UnsupportedNode` if the node is a config node
    pub fn set_trigger<const N: usize, const W: usize>(
        &mut self,
        storage: &mut NodeStorage<N, W>,
        target: TriggerTarget,
        trigger: TriggerConfig,
    ) -> Result<()> {
        self.ensure_mutable()?;
        let index = match target {
            TriggerTarget::Queue => self.head.ok_or(QueueError::Empty)?,
            TriggerTarget::Node(index) => {
                self.ensure_member(storage, index)?;
                if storage.node(index)?.kind() != NodeKind::Data {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("trigger on config node {} rejected", index);
                    #[cfg(feature = "log")]
                    warn!("trigger on config node {index:?} rejected");
                    return Err(QueueError::UnsupportedNode.into());
                }
                index
            }
        };

        let rebuilt = storage.node(index)?.with_trigger(trigger);
        storage.slot_mut(index)?.node = rebuilt;

        #[cfg(feature = "defmt")]
        defmt::info!("queue {}: trigger on node {}", self.id, index);
        #[cfg(feature = "log")]
        info!("queue {:?}: trigger on node {index:?}", self.id);

        Ok(())
    }

    /// Close the queue into a ring.
    ///
    /// The tail links back to `entry`, or to the head when `entry` is `None`.
    /// An empty queue is only frozen. After this call the queue rejects
    /// appends and modifiers.
    ///
    /// # Errors
    ///
    /// - `QueueError::Frozen` if the queue is already circular
    /// - `QueueError::NotInQueue` if `entry` belongs elsewhere
    pub fn set_circular<const N: usize, const W: usize>(
        &mut self,
        storage: &mut NodeStorage<N, W>,
        entry: Option<NodeIndex>,
    ) -> Result<()> {
        self.ensure_mutable()?;
        let entry = match entry {
            Some(index) => {
                self.ensure_member(storage, index)?;
                Some(index)
            }
            None => self.head,
        };

        if let (Some(tail), Some(entry)) = (self.tail, entry) {
            storage.slot_mut(tail)?.next = Some(entry);
        }
        self.circular_entry = entry;
        self.frozen = true;

        #[cfg(feature = "defmt")]
        defmt::info!("queue {}: circular, entry {}", self.id, entry);
        #[cfg(feature = "log")]
        info!("queue {:?}: circular, entry {entry:?}", self.id);

        Ok(())
    }

    /// Selectively update increments, widths and event mode of a data node.
    ///
    /// # Errors
    ///
    /// - `QueueError::Frozen` if the queue was circularized
    /// - `QueueError::NotInQueue` if the node belongs elsewhere
    /// - `QueueError::UnsupportedNode` if the node is a config node
    pub fn set_data_config<const N: usize, const W: usize>(
        &mut self,
        storage: &mut NodeStorage<N, W>,
        index: NodeIndex,
        update: DataConfigUpdate,
    ) -> Result<()> {
        self.ensure_mutable()?;
        self.ensure_member(storage, index)?;
        let node = *storage.node(index)?;
        if node.kind() != NodeKind::Data {
            #[cfg(feature = "defmt")]
            defmt::warn!("data config on config node {} rejected", index);
            #[cfg(feature = "log")]
            warn!("data config on config node {index:?} rejected");
            return Err(QueueError::UnsupportedNode.into());
        }

        let rebuilt = node.with_transfer(node.transfer().apply(&update));
        storage.slot_mut(index)?.node = rebuilt;

        #[cfg(feature = "defmt")]
        defmt::info!("queue {}: data config on node {}", self.id, index);
        #[cfg(feature = "log")]
        info!("queue {:?}: data config on node {index:?}", self.id);

        Ok(())
    }

    /// Set the transfer-complete event mode of any node of the queue.
    ///
    /// # Errors
    ///
    /// - `QueueError::Frozen` if the queue was circularized
    /// - `QueueError::NotInQueue` if the node belongs elsewhere
    pub fn set_transfer_event<const N: usize, const W: usize>(
        &mut self,
        storage: &mut NodeStorage<N, W>,
        index: NodeIndex,
        event: TransferEvent,
    ) -> Result<()> {
        self.ensure_mutable()?;
        self.ensure_member(storage, index)?;
        let node: Node = *storage.node(index)?;

        let mut transfer = *node.transfer();
        transfer.event = event;
        storage.slot_mut(index)?.node = node.with_transfer(transfer);

        #[cfg(feature = "defmt")]
        defmt::info!("queue {}: event {} on node {}", self.id, event, index);
        #[cfg(feature = "log")]
        info!("queue {:?}: event {event:?} on node {index:?}", self.id);

        Ok(())
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.frozen {
            #[cfg(feature = "defmt")]
            defmt::warn!("modify frozen queue {} rejected", self.id);
            #[cfg(feature = "log")]
            warn!("modify frozen queue {:?} rejected", self.id);
            return Err(QueueError::Frozen.into());
        }
        Ok(())
    }

    fn ensure_member<const N: usize, const W: usize>(
        &self,
        storage: &NodeStorage<N, W>,
        index: NodeIndex,
    ) -> Result<()> {
        if self.contains(storage, index) {
            Ok(())
        } else {
            Err(QueueError::NotInQueue.into())
        }
    }
}

/// Iterator over a queue's nodes, head to tail.
pub struct QueueIter<'a, const N: usize, const W: usize> {
    storage: &'a NodeStorage<N, W>,
    next: Option<NodeIndex>,
    remaining: usize,
}

impl<'a, const N: usize, const W: usize> Iterator for QueueIter<'a, N, W> {
    type Item = (NodeIndex, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let index = self.next?;
        let slot = self.storage.slot(index).ok()?;
        self.next = slot.next;
        self.remaining -= 1;
        Some((index, &slot.node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;
    use crate::error::{Error, StorageError};
    use crate::node::{
        DataTransfer, DataWidth, Endpoint, TriggerMode, TriggerPolarity, WordSpan,
    };

    type Storage = NodeStorage<8, 8>;

    fn data_node(id: u32) -> Node {
        Node::data(
            id,
            DataTransfer::new(
                Endpoint::Memory(0x2000_0000),
                Endpoint::Register(0x4000_0028),
                8,
                DataWidth::Byte,
            ),
        )
    }

    fn config_node(id: u32) -> Node {
        Node::config(id, 0x4000_0000, WordSpan::default())
    }

    fn trigger() -> TriggerConfig {
        TriggerConfig::new(TriggerMode::Block, TriggerPolarity::Rising, 3)
    }

    /// Build a queue of `n` data nodes
    fn queue_with(storage: &mut Storage, n: usize) -> Queue {
        let mut queue = storage.new_queue().unwrap();
        for id in 0..n {
            let index = storage.push(data_node(id as u32)).unwrap();
            queue.append(storage, index).unwrap();
        }
        queue
    }

    fn ids(queue: &Queue, storage: &Storage) -> Vec<u32> {
        queue.iter(storage).map(|(_, node)| node.id()).collect()
    }

    // =========================================================================
    // Append
    // =========================================================================

    #[test]
    fn new_queue_is_empty() {
        let mut storage = Storage::new();
        let queue = storage.new_queue().unwrap();

        assert!(queue.is_empty());
        assert_eq!(queue.head(), None);
        assert_eq!(queue.iter(&storage).count(), 0);
        assert_eq!(
            queue.head_address(&storage),
            Err(Error::Queue(QueueError::Empty))
        );
    }

    #[test]
    fn append_preserves_order() {
        let mut storage = Storage::new();
        let queue = queue_with(&mut storage, 3);

        assert_eq!(queue.len(), 3);
        assert_eq!(ids(&queue, &storage), [0, 1, 2]);
        assert_eq!(queue.head(), Some(NodeIndex::new(0)));
        assert_eq!(queue.tail(), Some(NodeIndex::new(2)));
    }

    #[test]
    fn append_links_through_storage() {
        let mut storage = Storage::new();
        let queue = queue_with(&mut storage, 2);

        assert_eq!(
            storage.next(NodeIndex::new(0)).unwrap(),
            Some(NodeIndex::new(1))
        );
        assert_eq!(storage.next(NodeIndex::new(1)).unwrap(), None);
        assert_eq!(
            queue.head_address(&storage).unwrap(),
            storage.node_address(NodeIndex::new(0)).unwrap()
        );
    }

    #[test]
    fn pushed_node_links_into_one_queue_only() {
        let mut storage = Storage::new();
        let mut first = storage.new_queue().unwrap();
        let mut second = storage.new_queue().unwrap();
        let node = Node::data(
            7,
            DataTransfer::new(
                Endpoint::Memory(0x2000_1000),
                Endpoint::Register(0x4000_0028),
                16,
                DataWidth::HalfWord,
            ),
        );

        let index = storage.push(node).unwrap();
        first.append(&mut storage, index).unwrap();

        assert_eq!(first.head(), Some(index));
        assert_eq!(storage.node(index).unwrap(), &node);
        assert_eq!(
            second.append(&mut storage, index),
            Err(Error::Queue(QueueError::AlreadyLinked))
        );
        assert!(second.is_empty());
        assert!(first.contains(&storage, index));
    }

    #[test]
    fn append_same_node_twice_fails() {
        let mut storage = Storage::new();
        let mut queue = queue_with(&mut storage, 1);

        assert_eq!(
            queue.append(&mut storage, NodeIndex::new(0)),
            Err(Error::Queue(QueueError::AlreadyLinked))
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn append_node_of_other_queue_fails() {
        let mut storage = Storage::new();
        let first = queue_with(&mut storage, 1);
        let mut second = storage.new_queue().unwrap();

        let linked = first.head().unwrap();
        assert_eq!(
            second.append(&mut storage, linked),
            Err(Error::Queue(QueueError::AlreadyLinked))
        );
        assert!(second.is_empty());
    }

    #[test]
    fn append_unbuilt_slot_fails() {
        let mut storage = Storage::new();
        let mut queue = storage.new_queue().unwrap();

        assert_eq!(
            queue.append(&mut storage, NodeIndex::new(5)),
            Err(Error::Storage(StorageError::InvalidSlot))
        );
    }

    // =========================================================================
    // Circular mode
    // =========================================================================

    #[test]
    fn append_after_circular_fails_for_every_queue_state() {
        for n in [0, 1, 4] {
            let mut storage = Storage::new();
            let mut queue = queue_with(&mut storage, n);
            queue.set_circular(&mut storage, None).unwrap();

            let extra = storage.push(data_node(99)).unwrap();
            assert_eq!(
                queue.append(&mut storage, extra),
                Err(Error::Queue(QueueError::Frozen)),
                "queue with {n} nodes accepted append after circularization"
            );
            assert_eq!(queue.len(), n);
        }
    }

    #[test]
    fn circular_defaults_to_head() {
        let mut storage = Storage::new();
        let mut queue = queue_with(&mut storage, 3);

        queue.set_circular(&mut storage, None).unwrap();

        assert!(queue.is_frozen());
        assert_eq!(queue.circular_entry(), queue.head());
        assert_eq!(storage.next(queue.tail().unwrap()).unwrap(), queue.head());
    }

    #[test]
    fn circular_with_reentry_node() {
        let mut storage = Storage::new();
        let mut queue = queue_with(&mut storage, 3);
        let entry = NodeIndex::new(1);

        queue.set_circular(&mut storage, Some(entry)).unwrap();

        // Backend walk: 0 -> 1 -> 2 -> 1 -> 2
        let mut walk = Vec::new();
        let mut cursor = queue.head();
        for _ in 0..5 {
            let index = cursor.unwrap();
            walk.push(index.get());
            cursor = storage.next(index).unwrap();
        }
        assert_eq!(walk, [0, 1, 2, 1, 2]);

        // Single pass is unaffected by the back-link
        assert_eq!(ids(&queue, &storage), [0, 1, 2]);
    }

    #[test]
    fn circular_single_node_links_to_itself() {
        let mut storage = Storage::new();
        let mut queue = queue_with(&mut storage, 1);

        queue.set_circular(&mut storage, None).unwrap();

        let head = queue.head().unwrap();
        assert_eq!(storage.next(head).unwrap(), Some(head));
    }

    #[test]
    fn circular_twice_fails() {
        let mut storage = Storage::new();
        let mut queue = queue_with(&mut storage, 2);
        queue.set_circular(&mut storage, None).unwrap();

        assert_eq!(
            queue.set_circular(&mut storage, None),
            Err(Error::Queue(QueueError::Frozen))
        );
    }

    #[test]
    fn circular_reentry_must_belong_to_queue() {
        let mut storage = Storage::new();
        let other = queue_with(&mut storage, 1);
        let mut queue = queue_with(&mut storage, 2);

        assert_eq!(
            queue.set_circular(&mut storage, other.head()),
            Err(Error::Queue(QueueError::NotInQueue))
        );
        assert!(!queue.is_frozen());
        assert_eq!(storage.next(queue.tail().unwrap()).unwrap(), None);
    }

    // =========================================================================
    // Trigger gating
    // =========================================================================

    #[test]
    fn queue_trigger_gates_head_of_any_kind() {
        let mut storage = Storage::new();
        let mut queue = storage.new_queue().unwrap();
        let head = storage.push(config_node(1)).unwrap();
        queue.append(&mut storage, head).unwrap();

        queue
            .set_trigger(&mut storage, TriggerTarget::Queue, trigger())
            .unwrap();

        assert_eq!(storage.node(head).unwrap().trigger(), Some(&trigger()));
    }

    #[test]
    fn queue_trigger_on_empty_queue_fails() {
        let mut storage = Storage::new();
        let mut queue = storage.new_queue().unwrap();

        assert_eq!(
            queue.set_trigger(&mut storage, TriggerTarget::Queue, trigger()),
            Err(Error::Queue(QueueError::Empty))
        );
    }

    #[test]
    fn node_trigger_on_data_node() {
        let mut storage = Storage::new();
        let mut queue = queue_with(&mut storage, 2);
        let target = NodeIndex::new(1);

        queue
            .set_trigger(&mut storage, TriggerTarget::Node(target), trigger())
            .unwrap();

        assert_eq!(storage.node(target).unwrap().trigger(), Some(&trigger()));
        assert!(storage.node(NodeIndex::new(0)).unwrap().trigger().is_none());
    }

    #[test]
    fn node_trigger_on_config_node_unsupported() {
        let mut storage = Storage::new();
        let mut queue = storage.new_queue().unwrap();
        let config = storage.push(config_node(1)).unwrap();
        queue.append(&mut storage, config).unwrap();

        assert_eq!(
            queue.set_trigger(&mut storage, TriggerTarget::Node(config), trigger()),
            Err(Error::Queue(QueueError::UnsupportedNode))
        );
        assert!(storage.node(config).unwrap().trigger().is_none());
    }

    #[test]
    fn node_trigger_outside_queue_fails() {
        let mut storage = Storage::new();
        let mut queue = queue_with(&mut storage, 1);
        let loose = storage.push(data_node(5)).unwrap();

        assert_eq!(
            queue.set_trigger(&mut storage, TriggerTarget::Node(loose), trigger()),
            Err(Error::Queue(QueueError::NotInQueue))
        );
    }

    #[test]
    fn modifiers_rejected_after_circular() {
        let mut storage = Storage::new();
        let mut queue = queue_with(&mut storage, 2);
        queue.set_circular(&mut storage, None).unwrap();
        let node = NodeIndex::new(0);

        assert_eq!(
            queue.set_trigger(&mut storage, TriggerTarget::Queue, trigger()),
            Err(Error::Queue(QueueError::Frozen))
        );
        assert_eq!(
            queue.set_data_config(&mut storage, node, DataConfigUpdate::new()),
            Err(Error::Queue(QueueError::Frozen))
        );
        assert_eq!(
            queue.set_transfer_event(&mut storage, node, TransferEvent::Block),
            Err(Error::Queue(QueueError::Frozen))
        );
    }

    // =========================================================================
    // Data config and transfer event
    // =========================================================================

    #[test]
    fn data_config_update_rebuilds_node() {
        let mut storage = Storage::new();
        let mut queue = queue_with(&mut storage, 1);
        let node = NodeIndex::new(0);

        queue
            .set_data_config(
                &mut storage,
                node,
                DataConfigUpdate::new()
                    .with_source_increment(false)
                    .with_destination_width(DataWidth::Word),
            )
            .unwrap();

        let transfer = storage.node(node).unwrap().transfer();
        assert!(!transfer.source_increment);
        assert_eq!(transfer.destination_width, DataWidth::Word);
        assert_eq!(transfer.source_width, DataWidth::Byte);
    }

    #[test]
    fn data_config_on_config_node_unsupported() {
        let mut storage = Storage::new();
        let mut queue = storage.new_queue().unwrap();
        let config = storage.push(config_node(1)).unwrap();
        queue.append(&mut storage, config).unwrap();

        assert_eq!(
            queue.set_data_config(&mut storage, config, DataConfigUpdate::new()),
            Err(Error::Queue(QueueError::UnsupportedNode))
        );
    }

    #[test]
    fn transfer_event_on_any_node() {
        let mut storage = Storage::new();
        let mut queue = storage.new_queue().unwrap();
        let config = storage.push(config_node(1)).unwrap();
        queue.append(&mut storage, config).unwrap();

        queue
            .set_transfer_event(&mut storage, config, TransferEvent::LastLinkedItem)
            .unwrap();

        assert_eq!(
            storage.node(config).unwrap().transfer().event,
            TransferEvent::LastLinkedItem
        );
    }
}
