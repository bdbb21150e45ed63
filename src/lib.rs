//! LPBAM Queue Compiler
//!
//! A `no_std`, `no_alloc` library that compiles high-level peripheral
//! operations into linked lists of DMA transfer descriptors (nodes), so a
//! microcontroller can run multi-step peripheral sequences autonomously while
//! the CPU sleeps.
//!
//! Nothing here touches hardware. The crate produces node records and links in
//! caller-owned storage; an execution backend walks them.
//!
//! # Architecture
//!
//! The crate is organized into four layers:
//!
//! 1. **Storage** ([`storage`]): caller-owned arena of node slots, register
//!    words and links
//! 2. **Queue** ([`queue`]): append-only ordered lists of nodes, with trigger,
//!    circular and per-node reconfiguration
//! 3. **Transaction** ([`transaction`]): chunking of large transfers and
//!    sequential-frame flags
//! 4. **Builder** ([`builder`], [`factory`]): atomic translation of requests
//!    into nodes through a peripheral-specific [`NodeFactory`]
//!
//! Reference factories live in [`peripheral`].
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting and builder diagnostics
//! - `log`: Enable builder diagnostics through the `log` facade
//! - `critical-section`: Enable ISR-safe `SharedStorage` wrapper
//!
//! # Example
//!
//! ```ignore
//! use lpbam_queue::peripheral::{I2cMasterConfig, I2cMasterFactory, I2cOp};
//! use lpbam_queue::{
//!     DataWidth, Direction, MemoryRegion, NodeStorage, QueueBuilder, Transaction,
//!     TransferRequest,
//! };
//!
//! static mut STORAGE: NodeStorage<32, 32> = NodeStorage::new();
//!
//! fn compile(storage: &mut NodeStorage<32, 32>) -> lpbam_queue::Result<u32> {
//!     let mut queue = storage.new_queue()?;
//!     let mut builder = QueueBuilder::new(I2cMasterFactory::new(
//!         I2cMasterConfig::new(0x4600_2400, 0x50),
//!     ));
//!     let mut txn = Transaction::new(255)?;
//!
//!     let request = TransferRequest::new(
//!         MemoryRegion::new(0x2000_0000, DataWidth::Byte),
//!         400,
//!         Direction::MemoryToPeripheral,
//!     )
//!     .with_per_chunk(&[I2cOp::Transaction]);
//!
//!     // 400 bytes over a 255-byte limit: two chunks
//!     loop {
//!         let report = builder.build_full(storage, &mut queue, &mut txn, &request)?;
//!         if report.step.is_some_and(|step| step.chunk.last) {
//!             break;
//!         }
//!     }
//!     queue.set_circular(storage, None)?;
//!     Ok(queue.head_address(storage)?)
//! }
//! ```
//!
//! # Guarantees
//!
//! - A failed builder call leaves storage and queue exactly as before
//! - Appending preserves order and never reorders existing nodes
//! - A circular queue is frozen; further appends and modifiers are rejected

#![no_std]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
// Clippy lint levels live here and in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod builder;
pub mod constants;
pub mod error;
pub mod factory;
pub mod node;
pub mod peripheral;
pub mod queue;
pub mod storage;
pub mod transaction;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use builder::{BuildReport, MemoryRegion, QueueBuilder, TransferRequest};
pub use error::{
    Error, FactoryError, QueueError, QueueResult, Result, StorageError, StorageResult,
    TransferError, TransferResult,
};
pub use factory::{ChunkTransfer, ConfigNode, NodeFactory, fill_words};
pub use node::{
    DataConfigUpdate, DataTransfer, DataWidth, Direction, Endpoint, Node, NodeIndex, NodeKind,
    Payload, TransferConfig, TransferEvent, TriggerConfig, TriggerMode, TriggerPolarity,
    TriggerTarget, WordSpan,
};
pub use queue::{Queue, QueueId, QueueIter};
pub use storage::{DefaultNodeStorage, NodeStorage, StorageMark};
pub use transaction::{Chunk, ChunkCursor, FrameFlags, FrameSequencer, Transaction, TransferStep};

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::{SharedStorage, SharedStorageDefault, SharedStorageSmall};
