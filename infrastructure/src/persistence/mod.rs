//! Durable storage adapters

mod sqlite;

pub use sqlite::SqliteStore;
