//! SQL schema for the tutorlink SQLite backend.
//!
//! Executed once at connection startup. Future migrations will be gated
//! on `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Identity-provider state: one row per account.
CREATE TABLE IF NOT EXISTS accounts (
    uid             TEXT PRIMARY KEY,
    email           TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,   -- argon2 PHC string
    display_name    TEXT,
    disabled        INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,   -- ISO 8601 UTC
    failed_attempts INTEGER NOT NULL DEFAULT 0,
    last_failed_at  TEXT             -- ISO 8601 UTC or NULL
);

-- Document-store state: one row per (collection, key).
-- `fields` is always a JSON object; merge writes use json_patch().
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    key        TEXT NOT NULL,
    fields     TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (collection, key)
);

CREATE INDEX IF NOT EXISTS accounts_email_idx   ON accounts(email);
CREATE INDEX IF NOT EXISTS documents_coll_idx   ON documents(collection);

PRAGMA user_version = 1;
";
