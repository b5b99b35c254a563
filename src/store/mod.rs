//! Persistence layer — durable conversation slots.

pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use memory::MemorySessionStore;
pub use traits::SessionStore;
