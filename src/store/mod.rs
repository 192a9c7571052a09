pub mod json_store;
pub mod kv;
pub mod schema;
pub mod settings;
pub mod stats;

pub use kv::{KeyValueStore, MemoryStore, StoreError};
pub use stats::{ModeEvent, StatsStore};
