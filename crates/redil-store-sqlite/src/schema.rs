//! SQL schema for the Redil SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One table for every entity kind. The payload is the entity's JSON without
-- the id/timestamp envelope. Parent references are not foreign keys: the
-- hierarchy tolerates dangling parents and deletes never cascade.
CREATE TABLE IF NOT EXISTS records (
    id          TEXT PRIMARY KEY,
    kind        TEXT NOT NULL,   -- EntityKind, snake_case
    parent_id   TEXT,            -- Entity::parent_id
    unique_key  TEXT,            -- Entity::unique_key value, if any
    data_json   TEXT NOT NULL,
    created_at  TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS records_kind_idx   ON records(kind);
CREATE INDEX IF NOT EXISTS records_parent_idx ON records(kind, parent_id);
CREATE UNIQUE INDEX IF NOT EXISTS records_unique_idx
    ON records(kind, unique_key) WHERE unique_key IS NOT NULL;

PRAGMA user_version = 1;
";
