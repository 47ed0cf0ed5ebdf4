//! Key-value storage adapters.
//!
//! [`MemoryKeyValueStore`] backs tests and one-shot runs;
//! [`JsonFileKeyValueStore`] persists entries between CLI invocations the way
//! browser storage persists them between page loads.

mod file;
mod memory;

pub use file::{FileStoreError, JsonFileKeyValueStore};
pub use memory::MemoryKeyValueStore;
