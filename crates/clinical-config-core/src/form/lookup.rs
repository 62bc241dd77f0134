//! Reference resolution for template rows.

use std::collections::HashMap;

use crate::models::{CatalogItem, ItemKind, ItemRef};

/// Resolves a template's (kind, SKU) pair to a catalog reference.
pub trait ReferenceLookup {
    fn find(&self, kind: ItemKind, sku: &str) -> Option<ItemRef>;
}

impl<L: ReferenceLookup + ?Sized> ReferenceLookup for &L {
    fn find(&self, kind: ItemKind, sku: &str) -> Option<ItemRef> {
        (**self).find(kind, sku)
    }
}

/// In-memory lookup table keyed by kind and SKU.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    items: HashMap<(ItemKind, String), CatalogItem>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an item.
    pub fn insert(&mut self, item: CatalogItem) {
        self.items
            .insert((item.kind, item.sku.trim().to_string()), item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<CatalogItem> for ReferenceTable {
    fn from_iter<I: IntoIterator<Item = CatalogItem>>(iter: I) -> Self {
        let mut table = Self::new();
        for item in iter {
            table.insert(item);
        }
        table
    }
}

impl ReferenceLookup for ReferenceTable {
    fn find(&self, kind: ItemKind, sku: &str) -> Option<ItemRef> {
        let sku = sku.trim();
        if sku.is_empty() {
            return None;
        }
        self.items
            .get(&(kind, sku.to_string()))
            .filter(|item| item.active)
            .map(CatalogItem::to_ref)
    }
}
