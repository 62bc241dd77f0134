//! SQLite schema definition.

/// Complete local database schema.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Reference Catalog (medicines, vaccines, lab tests)
-- ============================================================================

CREATE TABLE IF NOT EXISTS reference_catalog (
    kind TEXT NOT NULL CHECK (kind IN ('medicine', 'vaccine', 'lab_test')),
    sku TEXT NOT NULL CHECK (length(trim(sku)) > 0),
    name TEXT NOT NULL,
    aliases TEXT NOT NULL DEFAULT '[]',           -- JSON array of strings
    active INTEGER NOT NULL DEFAULT 1,
    server_id TEXT,
    last_synced TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (kind, sku)
);

-- FTS5 virtual table for name search
CREATE VIRTUAL TABLE IF NOT EXISTS reference_catalog_fts USING fts5(
    sku,
    name,
    aliases,
    content='reference_catalog',
    content_rowid='rowid'
);

-- Triggers to keep FTS5 in sync with main table
CREATE TRIGGER IF NOT EXISTS reference_catalog_ai AFTER INSERT ON reference_catalog BEGIN
    INSERT INTO reference_catalog_fts(rowid, sku, name, aliases)
    VALUES (new.rowid, new.sku, new.name, new.aliases);
END;

CREATE TRIGGER IF NOT EXISTS reference_catalog_ad AFTER DELETE ON reference_catalog BEGIN
    INSERT INTO reference_catalog_fts(reference_catalog_fts, rowid, sku, name, aliases)
    VALUES ('delete', old.rowid, old.sku, old.name, old.aliases);
END;

CREATE TRIGGER IF NOT EXISTS reference_catalog_au AFTER UPDATE ON reference_catalog BEGIN
    INSERT INTO reference_catalog_fts(reference_catalog_fts, rowid, sku, name, aliases)
    VALUES ('delete', old.rowid, old.sku, old.name, old.aliases);
    INSERT INTO reference_catalog_fts(rowid, sku, name, aliases)
    VALUES (new.rowid, new.sku, new.name, new.aliases);
END;

CREATE INDEX IF NOT EXISTS idx_reference_server_id ON reference_catalog(server_id);

-- ============================================================================
-- Templates (read-only input to the merge engine)
-- ============================================================================

CREATE TABLE IF NOT EXISTS templates (
    template_id TEXT PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    payload TEXT NOT NULL,                       -- JSON Template
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_templates_name ON templates(name);

-- ============================================================================
-- Form Drafts (Staging Area - Mutable)
-- ============================================================================

CREATE TABLE IF NOT EXISTS form_drafts (
    draft_id TEXT PRIMARY KEY,
    specialty_id TEXT,
    form TEXT NOT NULL,                          -- JSON FormState
    status TEXT NOT NULL DEFAULT 'open',         -- open, submitted
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_drafts_specialty ON form_drafts(specialty_id);
CREATE INDEX IF NOT EXISTS idx_drafts_status ON form_drafts(status);
"#;
