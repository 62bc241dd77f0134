//! Fill-then-append merge over one row collection.

use std::collections::HashSet;

use crate::models::Row;

/// What a merge did to one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Candidates written into existing empty rows
    pub filled: usize,
    /// Candidates appended as new rows
    pub appended: usize,
    /// Candidates dropped because their SKU was already present
    pub skipped_duplicates: usize,
}

impl MergeStats {
    /// Number of rows the template contributed.
    pub fn contributed(&self) -> usize {
        self.filled + self.appended
    }
}

/// Merge `candidates` into a copy of `current`.
///
/// Empty rows are filled in ascending position order, keeping their ids;
/// leftover candidates are appended in candidate order. With
/// `suppress_duplicate_skus`, a candidate whose SKU matches a filled row or an
/// earlier accepted candidate is dropped.
pub fn fill_then_append<R: Row>(
    current: &[R],
    candidates: Vec<R>,
    suppress_duplicate_skus: bool,
) -> (Vec<R>, MergeStats) {
    let mut stats = MergeStats::default();
    let mut rows = current.to_vec();

    let mut seen: HashSet<String> = if suppress_duplicate_skus {
        rows.iter()
            .filter(|row| !row.is_empty())
            .filter_map(|row| row.sku().map(str::to_string))
            .collect()
    } else {
        HashSet::new()
    };

    // Every accepted candidate is consumed below, so marking its SKU seen
    // at acceptance time matches consumption order.
    let mut accepted = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if suppress_duplicate_skus {
            if let Some(sku) = candidate.sku() {
                if !seen.insert(sku.to_string()) {
                    stats.skipped_duplicates += 1;
                    continue;
                }
            }
        }
        accepted.push(candidate);
    }

    let empty_slots: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.is_empty())
        .map(|(index, _)| index)
        .collect();

    let mut accepted = accepted.into_iter();
    for slot in empty_slots {
        let Some(candidate) = accepted.next() else {
            break;
        };
        rows[slot].absorb(candidate);
        stats.filled += 1;
    }

    for candidate in accepted {
        rows.push(candidate);
        stats.appended += 1;
    }

    (rows, stats)
}
