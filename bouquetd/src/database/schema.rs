//! Database schema definitions.

/// SQL schema for the settings database.
pub const SCHEMA_SQL: &str = r#"
-- Persisted configuration records
CREATE TABLE IF NOT EXISTS settings (
    path TEXT PRIMARY KEY,               -- "<category>/<name>", e.g. "bouquet/<uuid>"
    category TEXT NOT NULL,              -- Record class ("bouquet")
    name TEXT NOT NULL,                  -- Record name within the category (uuid)
    body TEXT NOT NULL,                  -- JSON object with the record properties
    -- Metadata
    created_at INTEGER DEFAULT (strftime('%s', 'now')),
    updated_at INTEGER DEFAULT (strftime('%s', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_settings_category ON settings(category, name);
"#;
