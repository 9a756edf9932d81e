//! SQLite schema definitions.

/// Current schema version for migrations.
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema for the local progress database.
pub const SCHEMA: &str = r#"
-- Progress values, JSON encoded
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL
);
"#;

/// Record the schema version on first open.
pub const INIT_SCHEMA_VERSION: &str = r#"
INSERT OR IGNORE INTO schema_version (id, version) VALUES (1, 1);
"#;
