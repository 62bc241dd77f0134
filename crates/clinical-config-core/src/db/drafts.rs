//! Form draft database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{DraftStatus, FormDraft, FormState};

impl Database {
    /// Insert a new form draft.
    pub fn insert_draft(&self, draft: &FormDraft) -> DbResult<()> {
        let form_json = draft.form.to_json()?;
        let status_str = status_to_string(&draft.status);

        self.conn.execute(
            r#"
            INSERT INTO form_drafts (
                draft_id, specialty_id, form, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                draft.draft_id,
                draft.specialty_id,
                form_json,
                status_str,
                draft.created_at,
                draft.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing draft.
    pub fn update_draft(&self, draft: &FormDraft) -> DbResult<bool> {
        let form_json = draft.form.to_json()?;
        let status_str = status_to_string(&draft.status);

        let rows_affected = self.conn.execute(
            r#"
            UPDATE form_drafts SET
                specialty_id = ?2,
                form = ?3,
                status = ?4,
                updated_at = datetime('now')
            WHERE draft_id = ?1
            "#,
            params![draft.draft_id, draft.specialty_id, form_json, status_str],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a draft by ID.
    pub fn get_draft(&self, draft_id: &str) -> DbResult<Option<FormDraft>> {
        self.conn
            .query_row(
                r#"
                SELECT draft_id, specialty_id, form, status, created_at, updated_at
                FROM form_drafts
                WHERE draft_id = ?
                "#,
                [draft_id],
                |row| {
                    Ok(DraftRow {
                        draft_id: row.get(0)?,
                        specialty_id: row.get(1)?,
                        form: row.get(2)?,
                        status: row.get(3)?,
                        created_at: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List open drafts, most recently edited first.
    pub fn list_open_drafts(&self) -> DbResult<Vec<FormDraft>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT draft_id, specialty_id, form, status, created_at, updated_at
            FROM form_drafts
            WHERE status = 'open'
            ORDER BY updated_at DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(DraftRow {
                draft_id: row.get(0)?,
                specialty_id: row.get(1)?,
                form: row.get(2)?,
                status: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })?;

        let mut drafts = Vec::new();
        for row in rows {
            drafts.push(row?.try_into()?);
        }
        Ok(drafts)
    }

    /// Delete a draft.
    pub fn delete_draft(&self, draft_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM form_drafts WHERE draft_id = ?", [draft_id])?;
        Ok(rows_affected > 0)
    }

    /// Mark draft as submitted.
    pub fn mark_draft_submitted(&self, draft_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE form_drafts SET status = 'submitted', updated_at = datetime('now') WHERE draft_id = ?",
            [draft_id],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct DraftRow {
    draft_id: String,
    specialty_id: Option<String>,
    form: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<DraftRow> for FormDraft {
    type Error = DbError;

    fn try_from(row: DraftRow) -> Result<Self, Self::Error> {
        let form = FormState::from_json(&row.form)?;
        let status = string_to_status(&row.status)?;

        Ok(FormDraft {
            draft_id: row.draft_id,
            specialty_id: row.specialty_id,
            form,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn status_to_string(status: &DraftStatus) -> &'static str {
    match status {
        DraftStatus::Open => "open",
        DraftStatus::Submitted => "submitted",
    }
}

fn string_to_status(s: &str) -> Result<DraftStatus, DbError> {
    match s {
        "open" => Ok(DraftStatus::Open),
        "submitted" => Ok(DraftStatus::Submitted),
        _ => Err(DbError::Constraint(format!("Unknown draft status: {}", s))),
    }
}
