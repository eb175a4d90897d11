//! Durable local storage: namespaced JSON blobs in libSQL or memory.

pub mod envelope;
pub mod libsql_backend;
pub mod memory;
mod migrations;
pub mod traits;

pub use envelope::{Envelope, load, load_or_default, save, storage_keys};
pub use libsql_backend::LibSqlStore;
pub use memory::MemoryStore;
pub use traits::KeyValueStore;
