//! Asynchronous front end for the core components
//!
//! - **AsyncTransactionEngine**: runs engine and history calls on tokio's
//!   blocking pool behind a cloneable handle
//! - **BatchProcessor**: processes batches concurrently, one task per user
//!
//! # Thread Safety
//!
//! Both types are cheap to clone and share the same directory and store.
//! Operations of one user are never reordered; operations of different
//! users proceed in parallel, synchronised by the store's row locks.

pub mod batch_processor;
pub mod engine;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use engine::AsyncTransactionEngine;
