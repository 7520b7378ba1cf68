//! Durable storage for finished record series.

pub mod sqlite;

pub use sqlite::{SqliteStore, StoreStats};
