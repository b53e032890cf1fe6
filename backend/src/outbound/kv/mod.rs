//! Key-value store adapters.
//!
//! - [`InMemoryKeyValueStore`]: process-local, used by tests and by
//!   deployments without a data directory.
//! - [`FileKeyValueStore`]: one JSON document per key under a directory.

mod file;
mod memory;

pub use file::FileKeyValueStore;
pub use memory::InMemoryKeyValueStore;
