//! # storage-adapters
//!
//! Implementations of the `domains` repository ports.
//!
//! - [`MemoryStore`] is always compiled and keeps everything in process.
//! - [`SqliteStore`] (feature `db-sqlite`) persists to SQLite through sqlx,
//!   with the schema applied from embedded migrations.

pub mod memory;
#[cfg(feature = "db-sqlite")]
pub mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "db-sqlite")]
pub use sqlite::SqliteStore;
