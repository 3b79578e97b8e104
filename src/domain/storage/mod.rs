//! Storage domain - collections and the document store abstraction

mod document_store;
mod entity;
mod filter;
mod repository;

pub use document_store::{DocumentStore, WriteBatch, WriteOp};
pub use entity::{StorageEntity, StorageKey};
pub use filter::DocumentFilter;
pub use repository::Storage;
