//! Reference catalog models (medicines, vaccines, lab tests).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of orderable item a form row can reference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Medicine,
    Vaccine,
    LabTest,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Medicine => "medicine",
            ItemKind::Vaccine => "vaccine",
            ItemKind::LabTest => "lab_test",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "medicine" | "product" => Ok(ItemKind::Medicine),
            "vaccine" => Ok(ItemKind::Vaccine),
            "lab_test" | "labtest" | "lab-test" => Ok(ItemKind::LabTest),
            other => Err(format!("unknown item kind: {}", other)),
        }
    }
}

/// A single item in the reference catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    /// Stock Keeping Unit - unique within a kind
    pub sku: String,
    /// What kind of row this item fills
    pub kind: ItemKind,
    /// Display name
    pub name: String,
    /// Alternative names for search
    pub aliases: Vec<String>,
    /// Backend identifier, if the item came from the server
    pub server_id: Option<String>,
    /// Whether this item is currently orderable
    pub active: bool,
    /// Last sync timestamp
    pub last_synced: Option<String>,
}

impl CatalogItem {
    /// Create a new catalog item with required fields.
    pub fn new(kind: ItemKind, sku: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            kind,
            name: name.into(),
            aliases: Vec::new(),
            server_id: None,
            active: true,
            last_synced: None,
        }
    }

    /// Reference a form row holds for this item.
    pub fn to_ref(&self) -> ItemRef {
        ItemRef {
            id: self.server_id.clone(),
            sku: self.sku.clone(),
            name: self.name.clone(),
            kind: self.kind,
            synthetic: false,
        }
    }
}

/// Reference from a form row to an orderable item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    /// Backend identifier when known
    pub id: Option<String>,
    pub sku: String,
    pub name: String,
    pub kind: ItemKind,
    /// True when built from raw template fields instead of a catalog hit
    #[serde(default)]
    pub synthetic: bool,
}

impl ItemRef {
    /// Build a reference from raw template fields when no catalog entry matches.
    pub fn synthetic(
        kind: ItemKind,
        id: Option<String>,
        sku: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.filter(|s| !s.trim().is_empty()),
            sku: sku.into(),
            name: name.into(),
            kind,
            synthetic: true,
        }
    }
}
