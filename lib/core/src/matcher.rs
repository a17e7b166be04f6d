use crate::candidate::trim_code;
use crate::{CandidateSet, ProductRecord, ProductTable};
use ahash::AHashSet;

/// Normal form used for every code comparison: trimmed, uppercased
#[inline]
pub fn normalize_code(code: &str) -> String {
    trim_code(code).to_uppercase()
}

/// Case-insensitive exact matcher over a product table.
///
/// The table is scanned in stored order and the first record whose barcode
/// equals any candidate wins, so duplicate barcodes always resolve to the
/// earliest record.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher;

impl Matcher {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub fn find<'t>(
        &self,
        candidates: &CandidateSet,
        table: &'t ProductTable,
    ) -> Option<&'t ProductRecord> {
        self.position(candidates, table)
            .and_then(|index| table.get(index))
    }

    /// Table index of the record [`Matcher::find`] would return
    pub fn position(&self, candidates: &CandidateSet, table: &ProductTable) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }

        let wanted: AHashSet<String> = candidates.iter().map(normalize_code).collect();
        table
            .iter()
            .position(|record| wanted.contains(&record.normalized_barcode()))
    }
}
