//! Reference [`KeyValueBackend`](outbox_core::KeyValueBackend) implementations
//!
//! - [`MemoryBackend`]: in-process map with quota and failure injection, for tests
//! - [`FileBackend`]: one file per key in a directory

pub mod file;
pub mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;
