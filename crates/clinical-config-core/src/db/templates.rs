//! Template store operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::Template;

impl Database {
    /// Insert or update a template, keyed by its id.
    pub fn upsert_template(&self, template: &Template) -> DbResult<()> {
        if template.id.trim().is_empty() {
            return Err(DbError::Constraint("template id is blank".into()));
        }
        if template.name.trim().is_empty() {
            return Err(DbError::Constraint(format!(
                "template {} has a blank name",
                template.id
            )));
        }
        let payload = template.to_json()?;

        self.conn.execute(
            r#"
            INSERT INTO templates (template_id, name, payload, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(template_id) DO UPDATE SET
                name = excluded.name,
                payload = excluded.payload,
                updated_at = datetime('now')
            "#,
            params![template.id, template.name, payload],
        )?;
        Ok(())
    }

    /// Get a template by id.
    pub fn get_template(&self, template_id: &str) -> DbResult<Option<Template>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM templates WHERE template_id = ?",
                [template_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(payload.map(|p| Template::from_json(&p)).transpose()?)
    }

    /// Get a template by id, failing when it does not exist.
    pub fn require_template(&self, template_id: &str) -> DbResult<Template> {
        self.get_template(template_id)?
            .ok_or_else(|| DbError::NotFound(format!("template {}", template_id)))
    }

    /// List all templates ordered by name.
    pub fn list_templates(&self) -> DbResult<Vec<Template>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM templates ORDER BY name, template_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut templates = Vec::new();
        for payload in rows {
            templates.push(Template::from_json(&payload?)?);
        }
        Ok(templates)
    }

    /// Delete a template.
    pub fn delete_template(&self, template_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM templates WHERE template_id = ?", [template_id])?;
        Ok(rows_affected > 0)
    }
}
