//! Clinical Config Core Library
//!
//! Specialty diagnosis catalogs and prescription-form template merging for
//! a clinical authoring client.
//!
//! # Architecture
//!
//! ```text
//!   Backend catalog (REST)                     Template (local store)
//!           │                                          │
//!           ▼                                          ▼
//!   Normalization → Dedupe                   Candidate extraction
//!           │                                  (catalog lookup)
//!   ┌───────▼────────────────┐                         │
//!   │ SpecialtyConfigStore   │              ┌──────────▼──────────┐
//!   │  cache per specialty   │              │  Fill pass (empty   │
//!   │  create vs. replace    │              │  rows, in order)    │
//!   │  re-fetch after write  │              │  Append pass (SKU   │
//!   └───────┬────────────────┘              │  dedup: medicines)  │
//!           │                               └──────────┬──────────┘
//!           ▼                                          ▼
//!    Diagnosis catalog                          New FormState
//!   (editor, picker lists)                 (drafts, reset to initial)
//! ```
//!
//! # Core Principle
//!
//! **The server response is ground truth.** Every catalog mutation is
//! followed by a re-fetch, and merges never overwrite what a user typed.
//!
//! # Modules
//!
//! - [`db`]: SQLite layer (reference catalog with FTS5, templates, drafts)
//! - [`models`]: Domain types (Diagnosis, Template, FormState, row types)
//! - [`diagnosis`]: Catalog cleaning (normalizer + deduper)
//! - [`store`]: Specialty config store over a [`store::ConfigBackend`]
//! - [`form`]: Template merge engine and form reset

pub mod db;
pub mod diagnosis;
pub mod form;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use db::Database;
pub use diagnosis::{clean, DiagnosisError};
pub use form::{reset_all, MergeReport, ReferenceLookup, ReferenceTable, TemplateMergeEngine};
pub use models::{
    CatalogItem, Diagnosis, DraftStatus, FormDraft, FormState, ItemKind, ItemRef, RawDiagnosis,
    SpecialtyConfig, Template,
};
pub use store::{
    BackendError, ConfigBackend, ConfigDocument, ConfigPayload, PersistRequest, SaveOutcome,
    SpecialtyConfigStore, StoreError,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicalConfigError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for ClinicalConfigError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => ClinicalConfigError::NotFound(what),
            db::DbError::Constraint(msg) => ClinicalConfigError::InvalidInput(msg),
            other => ClinicalConfigError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ClinicalConfigError {
    fn from(e: serde_json::Error) -> Self {
        ClinicalConfigError::SerializationError(e.to_string())
    }
}

impl From<DiagnosisError> for ClinicalConfigError {
    fn from(e: DiagnosisError) -> Self {
        ClinicalConfigError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicalConfigError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicalConfigError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

fn parse_kind(kind: &str) -> Result<ItemKind, ClinicalConfigError> {
    kind.parse().map_err(ClinicalConfigError::InvalidInput)
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<ClinicalConfigCore>, ClinicalConfigError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(ClinicalConfigCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<ClinicalConfigCore>, ClinicalConfigError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(ClinicalConfigCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Normalize and deduplicate a diagnosis list.
#[uniffi::export]
pub fn clean_diagnosis_list(diagnoses: Vec<FfiDiagnosis>) -> Result<Vec<FfiDiagnosis>, ClinicalConfigError> {
    let raw: Vec<RawDiagnosis> = diagnoses.into_iter().map(|d| d.into()).collect();
    let cleaned = diagnosis::clean(&raw)?;
    Ok(cleaned.into_iter().map(|d| d.into()).collect())
}

/// A fresh form in its initial state, as JSON.
#[uniffi::export]
pub fn reset_form_json() -> Result<String, ClinicalConfigError> {
    Ok(reset_all().to_json()?)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct ClinicalConfigCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl ClinicalConfigCore {
    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Add or update a catalog item.
    pub fn upsert_catalog_item(&self, item: FfiCatalogItem) -> Result<(), ClinicalConfigError> {
        let catalog_item = CatalogItem::try_from(item)?;
        let db = self.db.lock()?;
        db.upsert_catalog_item(&catalog_item)?;
        Ok(())
    }

    /// Get a catalog item by kind and SKU.
    pub fn get_catalog_item(
        &self,
        kind: String,
        sku: String,
    ) -> Result<Option<FfiCatalogItem>, ClinicalConfigError> {
        let kind = parse_kind(&kind)?;
        let db = self.db.lock()?;
        let item = db.get_catalog_item(kind, &sku)?;
        Ok(item.map(|i| i.into()))
    }

    /// Search active catalog items of one kind by name/alias.
    pub fn search_catalog(
        &self,
        kind: String,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiCatalogItem>, ClinicalConfigError> {
        let kind = parse_kind(&kind)?;
        let db = self.db.lock()?;
        let items = db.search_catalog(kind, &query, limit as usize)?;
        Ok(items.into_iter().map(|i| i.into()).collect())
    }

    // =========================================================================
    // Template Operations
    // =========================================================================

    /// Store a template given as JSON.
    pub fn save_template_json(&self, template_json: String) -> Result<(), ClinicalConfigError> {
        let template = Template::from_json(&template_json)?;
        let db = self.db.lock()?;
        db.upsert_template(&template)?;
        Ok(())
    }

    /// Get a template as JSON.
    pub fn get_template_json(
        &self,
        template_id: String,
    ) -> Result<Option<String>, ClinicalConfigError> {
        let db = self.db.lock()?;
        let template = db.get_template(&template_id)?;
        Ok(template.map(|t| t.to_json()).transpose()?)
    }

    /// List stored templates.
    pub fn list_templates(&self) -> Result<Vec<FfiTemplateSummary>, ClinicalConfigError> {
        let db = self.db.lock()?;
        let templates = db.list_templates()?;
        Ok(templates.into_iter().map(|t| t.into()).collect())
    }

    /// Delete a template.
    pub fn delete_template(&self, template_id: String) -> Result<bool, ClinicalConfigError> {
        let db = self.db.lock()?;
        Ok(db.delete_template(&template_id)?)
    }

    // =========================================================================
    // Merge Operations
    // =========================================================================

    /// Merge a stored template into a form given as JSON.
    pub fn apply_template(
        &self,
        form_json: String,
        template_id: String,
    ) -> Result<FfiMergeResult, ClinicalConfigError> {
        let form = FormState::from_json(&form_json)?;
        let db = self.db.lock()?;
        let template = db.require_template(&template_id)?;

        let engine = TemplateMergeEngine::new(&*db);
        let (merged, report) = engine.apply_with_report(&form, &template);
        FfiMergeResult::new(&merged, &report)
    }

    // =========================================================================
    // Draft Operations
    // =========================================================================

    /// Create a new draft holding an initial form.
    pub fn create_draft(
        &self,
        specialty_id: Option<String>,
    ) -> Result<FfiFormDraft, ClinicalConfigError> {
        let db = self.db.lock()?;
        let draft = FormDraft::new(specialty_id);
        db.insert_draft(&draft)?;
        FfiFormDraft::try_from(draft)
    }

    /// Get a draft by ID.
    pub fn get_draft(&self, draft_id: String) -> Result<Option<FfiFormDraft>, ClinicalConfigError> {
        let db = self.db.lock()?;
        let draft = db.get_draft(&draft_id)?;
        draft.map(FfiFormDraft::try_from).transpose()
    }

    /// Replace a draft's form with the given JSON.
    pub fn save_draft_form(
        &self,
        draft_id: String,
        form_json: String,
    ) -> Result<FfiFormDraft, ClinicalConfigError> {
        let form = FormState::from_json(&form_json)?;
        let db = self.db.lock()?;
        let mut draft = open_draft(&db, &draft_id)?;
        draft.form = form;
        draft.touch();
        db.update_draft(&draft)?;
        FfiFormDraft::try_from(draft)
    }

    /// Merge a stored template into a draft and persist the result.
    pub fn apply_template_to_draft(
        &self,
        draft_id: String,
        template_id: String,
    ) -> Result<FfiFormDraft, ClinicalConfigError> {
        let db = self.db.lock()?;
        let mut draft = open_draft(&db, &draft_id)?;
        let template = db.require_template(&template_id)?;

        draft.form = TemplateMergeEngine::new(&*db).apply(&draft.form, &template);
        draft.touch();
        db.update_draft(&draft)?;
        FfiFormDraft::try_from(draft)
    }

    /// Return a draft's form to its initial state.
    pub fn reset_draft(&self, draft_id: String) -> Result<FfiFormDraft, ClinicalConfigError> {
        let db = self.db.lock()?;
        let mut draft = open_draft(&db, &draft_id)?;
        draft.form = reset_all();
        draft.touch();
        db.update_draft(&draft)?;
        FfiFormDraft::try_from(draft)
    }

    /// Drafts still being edited, most recent first.
    pub fn list_open_drafts(&self) -> Result<Vec<FfiFormDraft>, ClinicalConfigError> {
        let db = self.db.lock()?;
        let drafts = db.list_open_drafts()?;
        drafts.into_iter().map(FfiFormDraft::try_from).collect()
    }

    /// Mark a draft as handed off.
    pub fn submit_draft(&self, draft_id: String) -> Result<bool, ClinicalConfigError> {
        let db = self.db.lock()?;
        Ok(db.mark_draft_submitted(&draft_id)?)
    }
}

fn open_draft(db: &Database, draft_id: &str) -> Result<FormDraft, ClinicalConfigError> {
    let draft = db
        .get_draft(draft_id)?
        .ok_or_else(|| ClinicalConfigError::NotFound(format!("draft {}", draft_id)))?;
    if draft.status != DraftStatus::Open {
        return Err(ClinicalConfigError::InvalidInput(format!(
            "draft {} is already submitted",
            draft_id
        )));
    }
    Ok(draft)
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe catalog item. `kind` is one of `medicine`, `vaccine`, `lab_test`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCatalogItem {
    pub kind: String,
    pub sku: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub active: bool,
}

impl From<CatalogItem> for FfiCatalogItem {
    fn from(item: CatalogItem) -> Self {
        Self {
            kind: item.kind.to_string(),
            sku: item.sku,
            name: item.name,
            aliases: item.aliases,
            active: item.active,
        }
    }
}

impl TryFrom<FfiCatalogItem> for CatalogItem {
    type Error = ClinicalConfigError;

    fn try_from(item: FfiCatalogItem) -> Result<Self, Self::Error> {
        let mut catalog_item = CatalogItem::new(parse_kind(&item.kind)?, item.sku, item.name);
        catalog_item.aliases = item.aliases;
        catalog_item.active = item.active;
        Ok(catalog_item)
    }
}

/// FFI-safe diagnosis.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiDiagnosis {
    pub name: Option<String>,
    pub symptoms: Vec<String>,
}

impl From<FfiDiagnosis> for RawDiagnosis {
    fn from(d: FfiDiagnosis) -> Self {
        RawDiagnosis {
            name: d.name,
            symptoms: d.symptoms,
        }
    }
}

impl From<Diagnosis> for FfiDiagnosis {
    fn from(d: Diagnosis) -> Self {
        Self {
            name: Some(d.name),
            symptoms: d.symptoms,
        }
    }
}

/// FFI-safe template listing entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTemplateSummary {
    pub template_id: String,
    pub name: String,
}

impl From<Template> for FfiTemplateSummary {
    fn from(t: Template) -> Self {
        Self {
            template_id: t.id,
            name: t.name,
        }
    }
}

/// FFI-safe merge result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMergeResult {
    pub form_json: String,
    /// Empty rows populated by the template
    pub rows_filled: u32,
    /// Rows appended after the existing ones
    pub rows_appended: u32,
    /// Medicines dropped because their SKU was already present
    pub duplicates_skipped: u32,
    pub instructions_filled: bool,
}

impl FfiMergeResult {
    fn new(form: &FormState, report: &MergeReport) -> Result<Self, ClinicalConfigError> {
        let all = [
            report.symptoms,
            report.diagnoses,
            report.medicines,
            report.vaccines,
            report.lab_tests,
        ];
        Ok(Self {
            form_json: form.to_json()?,
            rows_filled: all.iter().map(|s| s.filled as u32).sum(),
            rows_appended: all.iter().map(|s| s.appended as u32).sum(),
            duplicates_skipped: all.iter().map(|s| s.skipped_duplicates as u32).sum(),
            instructions_filled: report.instructions_filled,
        })
    }
}

/// FFI-safe form draft.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFormDraft {
    pub draft_id: String,
    pub specialty_id: Option<String>,
    pub form_json: String,
    pub status: String,
    pub updated_at: String,
}

impl TryFrom<FormDraft> for FfiFormDraft {
    type Error = ClinicalConfigError;

    fn try_from(draft: FormDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            form_json: draft.form.to_json()?,
            draft_id: draft.draft_id,
            specialty_id: draft.specialty_id,
            status: format!("{:?}", draft.status),
            updated_at: draft.updated_at,
        })
    }
}
