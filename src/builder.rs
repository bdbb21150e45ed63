//! Queue builder.
//!
//! [`QueueBuilder`] binds a [`NodeFactory`] and compiles transfer requests
//! into nodes appended to a [`Queue`]. Three calls are provided:
//!
//! - [`build_config`](QueueBuilder::build_config): config nodes only
//! - [`build_data`](QueueBuilder::build_data): per-chunk config nodes and the
//!   data node of one chunk
//! - [`build_full`](QueueBuilder::build_full): like `build_data`, plus the
//!   setup nodes opening and the teardown nodes closing the transaction
//!
//! Every call is all-or-nothing. Nodes are staged in free slots first and only
//! linked once every node was built; on error the storage cursors and the
//! transaction are left as they were and the queue is untouched.

#[cfg(feature = "log")]
use log::{debug, warn};

use crate::error::{QueueError, Result};
use crate::factory::{ChunkTransfer, NodeFactory};
use crate::node::{DataWidth, Direction, Node, NodeIndex};
use crate::queue::Queue;
use crate::storage::NodeStorage;
use crate::transaction::{Transaction, TransferStep};

// =============================================================================
// Request
// =============================================================================

/// Memory buffer of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryRegion {
    /// Bus address of the first element
    pub address: u32,
    /// Element width
    pub width: DataWidth,
}

impl MemoryRegion {
    /// Create a region
    #[must_use]
    pub const fn new(address: u32, width: DataWidth) -> Self {
        Self { address, width }
    }

    /// Bus address of element `offset`
    #[must_use]
    pub const fn at(&self, offset: usize) -> u32 {
        self.address
            .wrapping_add((offset * self.width.bytes()) as u32)
    }
}

/// One frame of a transfer, as passed to a data or full builder call.
///
/// `size` is the frame's total element count and stays the same across the
/// calls emitting its chunks. The call closing a chunked frame may pass just
/// the remainder instead, when it fits one node.
///
/// # Example
///
/// ```ignore
/// const SETUP: &[I2cOp] = &[I2cOp::Disable, I2cOp::Timing(0x0010_0413), I2cOp::Enable];
///
/// let request = TransferRequest::new(
///     MemoryRegion::new(buf_addr, DataWidth::Byte),
///     400,
///     Direction::MemoryToPeripheral,
/// )
/// .with_setup(SETUP)
/// .with_per_chunk(&[I2cOp::Transaction]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest<'a, O> {
    /// Frame buffer
    pub buffer: MemoryRegion,
    /// Frame size in elements
    pub size: usize,
    /// Frames in the transaction (1 disables sequencing)
    pub frame_count: usize,
    /// Direction relative to the peripheral
    pub direction: Direction,
    /// Ops emitted before the first data node of the transaction
    pub setup: &'a [O],
    /// Ops emitted before every data node
    pub per_chunk: &'a [O],
    /// Ops emitted after the last data node of the transaction
    pub teardown: &'a [O],
}

impl<'a, O> TransferRequest<'a, O> {
    /// Single-frame request without config ops
    #[must_use]
    pub const fn new(buffer: MemoryRegion, size: usize, direction: Direction) -> Self {
        Self {
            buffer,
            size,
            frame_count: crate::constants::SINGLE_FRAME,
            direction,
            setup: &[],
            per_chunk: &[],
            teardown: &[],
        }
    }

    /// Set number of frames
    #[must_use]
    pub const fn with_frame_count(mut self, frame_count: usize) -> Self {
        self.frame_count = frame_count;
        self
    }

    /// Set setup ops
    #[must_use]
    pub const fn with_setup(mut self, ops: &'a [O]) -> Self {
        self.setup = ops;
        self
    }

    /// Set per-chunk ops
    #[must_use]
    pub const fn with_per_chunk(mut self, ops: &'a [O]) -> Self {
        self.per_chunk = ops;
        self
    }

    /// Set teardown ops
    #[must_use]
    pub const fn with_teardown(mut self, ops: &'a [O]) -> Self {
        self.teardown = ops;
        self
    }
}

/// Outcome of a successful builder call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BuildReport {
    /// Transfer position, for data and full calls
    pub step: Option<TransferStep>,
    /// First appended node
    pub first: Option<NodeIndex>,
    /// Appended data node
    pub data: Option<NodeIndex>,
    /// Number of appended nodes
    pub nodes: usize,
}

// =============================================================================
// Builder
// =============================================================================

/// Compiles requests into queue nodes through a [`NodeFactory`].
#[derive(Debug)]
pub struct QueueBuilder<F> {
    factory: F,
}

impl<F: NodeFactory> QueueBuilder<F> {
    /// Bind a factory
    pub const fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Bound factory
    pub const fn factory(&self) -> &F {
        &self.factory
    }

    /// Bound factory, mutably
    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    /// Release the factory
    pub fn into_inner(self) -> F {
        self.factory
    }

    /// Append one config node per op.
    ///
    /// # Errors
    ///
    /// - `QueueError::Frozen` if the queue was circularized
    /// - `StorageError::NodesExhausted` / `StorageError::WordsExhausted`
    /// - any factory error
    pub fn build_config<const N: usize, const W: usize>(
        &mut self,
        storage: &mut NodeStorage<N, W>,
        queue: &mut Queue,
        ops: &[F::Op],
    ) -> Result<BuildReport> {
        ensure_open(queue)?;
        let mark = storage.mark();

        let staged = ops
            .iter()
            .try_for_each(|op| self.stage_config(storage, op, None).map(|_| ()));
        if let Err(e) = staged {
            storage.rollback(mark);
            #[cfg(feature = "defmt")]
            defmt::warn!("config build failed: {}", e);
            #[cfg(feature = "log")]
            warn!("config build failed: {e}");
            return Err(e);
        }

        link_staged(storage, queue, mark, None, None)
    }

    /// Append the per-chunk config nodes and the data node of the next chunk.
    ///
    /// # Errors
    ///
    /// - `QueueError::Frozen` if the queue was circularized
    /// - any `TransferError` from planning the step
    /// - `StorageError::NodesExhausted` / `StorageError::WordsExhausted`
    /// - any factory error
    pub fn build_data<const N: usize, const W: usize>(
        &mut self,
        storage: &mut NodeStorage<N, W>,
        queue: &mut Queue,
        txn: &mut Transaction,
        request: &TransferRequest<'_, F::Op>,
    ) -> Result<BuildReport> {
        self.build_transfer(storage, queue, txn, request, false)
    }

    /// Append the next chunk with its enclosing setup and teardown nodes.
    ///
    /// Setup ops are emitted when the step opens the transaction and teardown
    /// ops when it closes it (see [`TransferStep::needs_setup`] and
    /// [`TransferStep::needs_teardown`]).
    ///
    /// # Errors
    ///
    /// Same as [`build_data`](Self::build_data).
    pub fn build_full<const N: usize, const W: usize>(
        &mut self,
        storage: &mut NodeStorage<N, W>,
        queue: &mut Queue,
        txn: &mut Transaction,
        request: &TransferRequest<'_, F::Op>,
    ) -> Result<BuildReport> {
        self.build_transfer(storage, queue, txn, request, true)
    }

    fn build_transfer<const N: usize, const W: usize>(
        &mut self,
        storage: &mut NodeStorage<N, W>,
        queue: &mut Queue,
        txn: &mut Transaction,
        request: &TransferRequest<'_, F::Op>,
        enclosing: bool,
    ) -> Result<BuildReport> {
        ensure_open(queue)?;
        let mark = storage.mark();
        let mut next = *txn;

        let (step, data) = match self.stage_transfer(storage, &mut next, request, enclosing) {
            Ok(staged) => staged,
            Err(e) => {
                storage.rollback(mark);
                #[cfg(feature = "defmt")]
                defmt::warn!("transfer build failed: {}", e);
                #[cfg(feature = "log")]
                warn!("transfer build failed: {e}");
                return Err(e);
            }
        };

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "step offset={} len={} chunk=({},{}) frame {}=({},{})",
            step.offset(),
            step.len(),
            step.chunk.first,
            step.chunk.last,
            step.frame.index,
            step.frame.first,
            step.frame.last
        );
        #[cfg(feature = "log")]
        debug!(
            "step offset={} len={} chunk=({},{}) frame {}=({},{})",
            step.offset(),
            step.len(),
            step.chunk.first,
            step.chunk.last,
            step.frame.index,
            step.frame.first,
            step.frame.last
        );

        let report = link_staged(storage, queue, mark, Some(step), Some(data))?;
        *txn = next;
        Ok(report)
    }

    fn stage_transfer<const N: usize, const W: usize>(
        &mut self,
        storage: &mut NodeStorage<N, W>,
        txn: &mut Transaction,
        request: &TransferRequest<'_, F::Op>,
        enclosing: bool,
    ) -> Result<(TransferStep, NodeIndex)> {
        let step = txn.plan(request.size, request.frame_count)?;

        if enclosing && step.needs_setup() {
            for op in request.setup {
                self.stage_config(storage, op, Some(&step))?;
            }
        }
        for op in request.per_chunk {
            self.stage_config(storage, op, Some(&step))?;
        }

        let chunk = ChunkTransfer {
            step,
            address: request.buffer.at(step.offset()),
            len: step.len(),
            width: request.buffer.width,
            direction: request.direction,
        };
        let node = self.factory.build_data(&chunk)?;
        let data = storage.push(node)?;

        if enclosing && step.needs_teardown() {
            for op in request.teardown {
                self.stage_config(storage, op, Some(&step))?;
            }
        }

        Ok((step, data))
    }

    fn stage_config<const N: usize, const W: usize>(
        &mut self,
        storage: &mut NodeStorage<N, W>,
        op: &F::Op,
        step: Option<&TransferStep>,
    ) -> Result<NodeIndex> {
        let config = self
            .factory
            .build_config(op, step, storage.word_window())?;
        let words = storage.commit_words(config.words)?;
        Ok(storage.push(Node::config(config.id, config.register, words))?)
    }
}

fn ensure_open(queue: &Queue) -> Result<()> {
    if queue.is_frozen() {
        #[cfg(feature = "defmt")]
        defmt::warn!("build into frozen queue {} rejected", queue.id());
        #[cfg(feature = "log")]
        warn!("build into frozen queue {:?} rejected", queue.id());
        return Err(QueueError::Frozen.into());
    }
    Ok(())
}

/// Append every slot staged since `mark`.
///
/// Staged slots are built and unowned and the queue is open, so appending
/// cannot fail once staging succeeded.
fn link_staged<const N: usize, const W: usize>(
    storage: &mut NodeStorage<N, W>,
    queue: &mut Queue,
    mark: crate::storage::StorageMark,
    step: Option<TransferStep>,
    data: Option<NodeIndex>,
) -> Result<BuildReport> {
    let staged = storage.staged_since(mark);
    let report = BuildReport {
        step,
        first: (!staged.is_empty()).then(|| NodeIndex::new(staged.start)),
        data,
        nodes: staged.len(),
    };
    for slot in staged {
        queue.append(storage, NodeIndex::new(slot))?;
    }
    Ok(report)
}

// =============================================================================
// Tests
// =============================================================================
