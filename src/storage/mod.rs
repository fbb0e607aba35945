//! Storage module.
//!
//! Provides document store backends for PostgreSQL, SQLite and memory.

pub mod error;
pub mod traits;

// Storage backend implementations
pub mod memory;
pub mod postgres;
pub mod sqlite;

pub use error::StorageError;
pub use memory::MemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use sqlite::SqliteDocumentStore;
pub use traits::{DocumentStore, QueryFilter, new_document_id};
