//! Persistence collaborators
//!
//! - `RecordStore`: insert / query / subscribe for eco action records
//! - `ObjectStore`: binary uploads returning public URLs
//!
//! The NATS decorator in [`crate::nats`] adds cross-process realtime pushes
//! on top of any `RecordStore`.

mod objects;
mod records;

pub use objects::{LocalObjectStore, ObjectStore};
pub use records::{MemoryRecordStore, RecordFeed, RecordStore};
