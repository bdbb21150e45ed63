//! Synchronization Support
//!
//! Interrupt-safe access to node storage shared between the code building
//! queues and the code starting the execution backend.
//!
//! - **Primitives** (`primitives`): [`CriticalSectionCell`], ISR-safe interior
//!   mutability
//! - **Shared Wrappers** (`shared`): [`SharedStorage`], critical-section
//!   protected [`NodeStorage`](crate::NodeStorage)
//!
//! # Feature Flags
//!
//! - `critical-section`: Enables this module
//!
//! # Example
//!
//! ```ignore
//! use lpbam_queue::sync::SharedStorage;
//!
//! static STORAGE: SharedStorage<32, 32> = SharedStorage::new();
//!
//! #[interrupt]
//! fn LPDMA1_CH0() {
//!     STORAGE.with(|storage| {
//!         // Rebuild the next queue while the backend is idle
//!     });
//! }
//! ```

mod primitives;

pub use primitives::CriticalSectionCell;

mod shared;

pub use shared::{SharedStorage, SharedStorageDefault, SharedStorageSmall};
