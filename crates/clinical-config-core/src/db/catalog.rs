//! Reference catalog database operations.

use rusqlite::{params, OptionalExtension, Row as SqlRow};
use tracing::warn;

use super::{Database, DbError, DbResult};
use crate::form::{ReferenceLookup, ReferenceTable};
use crate::models::{CatalogItem, ItemKind, ItemRef};

const CATALOG_COLUMNS: &str =
    "c.kind, c.sku, c.name, c.aliases, c.active, c.server_id, c.last_synced";

impl Database {
    /// Insert or update a catalog item.
    pub fn upsert_catalog_item(&self, item: &CatalogItem) -> DbResult<()> {
        upsert(&self.conn, item)
    }

    /// Insert or update many items in one transaction.
    pub fn import_catalog_items(&mut self, items: &[CatalogItem]) -> DbResult<usize> {
        let tx = self.transaction()?;
        for item in items {
            upsert(&tx, item)?;
        }
        tx.commit()?;
        Ok(items.len())
    }

    /// Get a catalog item by kind and SKU.
    pub fn get_catalog_item(&self, kind: ItemKind, sku: &str) -> DbResult<Option<CatalogItem>> {
        let sql = format!(
            "SELECT {} FROM reference_catalog c WHERE c.kind = ?1 AND c.sku = ?2",
            CATALOG_COLUMNS
        );
        let result = self
            .conn
            .query_row(&sql, params![kind.as_str(), sku.trim()], read_row)
            .optional()?;

        result.map(|row| row.try_into()).transpose()
    }

    /// Search active items of a kind using FTS5 (BM25 ranking).
    pub fn search_catalog(
        &self,
        kind: ItemKind,
        query: &str,
        limit: usize,
    ) -> DbResult<Vec<CatalogItem>> {
        let escaped_query = escape_fts_query(query);
        if escaped_query.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT {}, bm25(reference_catalog_fts) as rank
            FROM reference_catalog c
            JOIN reference_catalog_fts fts ON c.rowid = fts.rowid
            WHERE reference_catalog_fts MATCH ?1
            AND c.kind = ?2
            AND c.active = 1
            ORDER BY rank
            LIMIT ?3
            "#,
            CATALOG_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![escaped_query, kind.as_str(), limit as i64],
            read_row,
        )?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?.try_into()?);
        }
        Ok(items)
    }

    /// List catalog items, optionally restricted to one kind.
    pub fn list_catalog_items(
        &self,
        kind: Option<ItemKind>,
        active_only: bool,
    ) -> DbResult<Vec<CatalogItem>> {
        let sql = format!(
            r#"
            SELECT {} FROM reference_catalog c
            WHERE (?1 IS NULL OR c.kind = ?1)
            AND (?2 = 0 OR c.active = 1)
            ORDER BY c.kind, c.name
            "#,
            CATALOG_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![kind.map(|k| k.as_str()), active_only], read_row)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?.try_into()?);
        }
        Ok(items)
    }

    /// Load every active item into an in-memory lookup table.
    pub fn reference_table(&self) -> DbResult<ReferenceTable> {
        Ok(self.list_catalog_items(None, true)?.into_iter().collect())
    }

    /// Delete a catalog item.
    pub fn delete_catalog_item(&self, kind: ItemKind, sku: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM reference_catalog WHERE kind = ?1 AND sku = ?2",
            params![kind.as_str(), sku.trim()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Mark item as inactive (soft delete).
    pub fn deactivate_catalog_item(&self, kind: ItemKind, sku: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE reference_catalog SET active = 0, updated_at = datetime('now') WHERE kind = ?1 AND sku = ?2",
            params![kind.as_str(), sku.trim()],
        )?;
        Ok(rows_affected > 0)
    }
}

impl ReferenceLookup for Database {
    fn find(&self, kind: ItemKind, sku: &str) -> Option<ItemRef> {
        if sku.trim().is_empty() {
            return None;
        }
        match self.get_catalog_item(kind, sku) {
            Ok(item) => item.filter(|i| i.active).map(|i| i.to_ref()),
            Err(err) => {
                warn!(%kind, sku, error = %err, "catalog lookup failed");
                None
            }
        }
    }
}

fn upsert(conn: &rusqlite::Connection, item: &CatalogItem) -> DbResult<()> {
    let sku = item.sku.trim();
    if sku.is_empty() {
        return Err(DbError::Constraint("catalog item SKU is blank".into()));
    }
    let aliases_json = serde_json::to_string(&item.aliases)?;

    conn.execute(
        r#"
        INSERT INTO reference_catalog (
            kind, sku, name, aliases, active, server_id, last_synced, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'))
        ON CONFLICT(kind, sku) DO UPDATE SET
            name = excluded.name,
            aliases = excluded.aliases,
            active = excluded.active,
            server_id = excluded.server_id,
            last_synced = excluded.last_synced,
            updated_at = datetime('now')
        "#,
        params![
            item.kind.as_str(),
            sku,
            item.name,
            aliases_json,
            item.active,
            item.server_id,
            item.last_synced,
        ],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct CatalogItemRow {
    kind: String,
    sku: String,
    name: String,
    aliases: String,
    active: bool,
    server_id: Option<String>,
    last_synced: Option<String>,
}

fn read_row(row: &SqlRow<'_>) -> rusqlite::Result<CatalogItemRow> {
    Ok(CatalogItemRow {
        kind: row.get(0)?,
        sku: row.get(1)?,
        name: row.get(2)?,
        aliases: row.get(3)?,
        active: row.get(4)?,
        server_id: row.get(5)?,
        last_synced: row.get(6)?,
    })
}

impl TryFrom<CatalogItemRow> for CatalogItem {
    type Error = DbError;

    fn try_from(row: CatalogItemRow) -> Result<Self, Self::Error> {
        Ok(CatalogItem {
            sku: row.sku,
            kind: row.kind.parse().map_err(DbError::Constraint)?,
            name: row.name,
            aliases: serde_json::from_str(&row.aliases)?,
            server_id: row.server_id,
            active: row.active,
            last_synced: row.last_synced,
        })
    }
}

/// Escape special FTS5 characters and prepare query for prefix matching.
fn escape_fts_query(query: &str) -> String {
    let cleaned: String = query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .map(|word| format!("{}*", word))
        .collect::<Vec<_>>()
        .join(" ")
}
