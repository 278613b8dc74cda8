//! SQL DDL for initializing the client storage.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `clients.id` / `client_credentials.id` INTEGER PRIMARY KEY AUTOINCREMENT
/// - `client_credentials.client_id` UNIQUE: at most one credentials row per client
/// - FK `client_id -> clients(id)` ON UPDATE CASCADE, ON DELETE SET NULL
///   (hence `client_id` is nullable)
///
/// Every statement is `IF NOT EXISTS`, so applying it again is a no-op.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name TEXT NOT NULL,
    age INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS client_credentials (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id INTEGER NULL UNIQUE
        REFERENCES clients(id) ON UPDATE CASCADE ON DELETE SET NULL,
    email TEXT NOT NULL,
    password TEXT NOT NULL
);
"#;
