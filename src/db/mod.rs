//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and the JSON they serialize to
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: the storage handle and client repository operations

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{BasicCredentials, Client, Credentials};
pub use schema::SQLITE_INIT;
pub use sqlite::{ClientStorage, SqlitePool};
