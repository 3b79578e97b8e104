//! Storage infrastructure - document store backends

mod factory;
mod handle;
mod in_memory;
mod postgres;

pub use factory::{StorageConfig, StorageFactory, StorageType};
pub use handle::{DatabaseHandle, PostgresConfig};
pub use in_memory::{InMemoryDocumentStore, InMemoryStorage};
pub use postgres::{PostgresDocumentStore, PostgresStorage};
