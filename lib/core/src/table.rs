use crate::ProductRecord;
use ahash::AHashMap;
use serde::Serialize;

/// A barcode stored by more than one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateBarcode {
    /// Normalized barcode
    pub barcode: String,
    /// Index of the record that wins lookups
    pub first: usize,
    /// Index of the shadowed record
    pub second: usize,
}

/// Ordered, read-only sequence of product records.
///
/// There is no mutating API: a table is built once by the loader and shared
/// (usually behind an `Arc`) by every lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProductTable {
    records: Vec<ProductRecord>,
}

impl ProductTable {
    pub fn new(records: Vec<ProductRecord>) -> Self {
        Self { records }
    }

    /// Table used when the real one is unavailable; every lookup misses
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&ProductRecord> {
        self.records.get(index)
    }

    #[inline]
    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    /// Records in table order
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, ProductRecord> {
        self.records.iter()
    }

    /// Every later record whose normalized barcode repeats an earlier one.
    /// Records with an empty barcode are ignored, they can never match.
    pub fn duplicates(&self) -> Vec<DuplicateBarcode> {
        let mut seen: AHashMap<String, usize> = AHashMap::with_capacity(self.records.len());
        let mut duplicates = Vec::new();

        for (index, record) in self.records.iter().enumerate() {
            let barcode = record.normalized_barcode();
            if barcode.is_empty() {
                continue;
            }
            match seen.get(&barcode) {
                Some(&first) => duplicates.push(DuplicateBarcode {
                    barcode,
                    first,
                    second: index,
                }),
                None => {
                    seen.insert(barcode, index);
                }
            }
        }

        duplicates
    }
}

impl FromIterator<ProductRecord> for ProductTable {
    fn from_iter<I: IntoIterator<Item = ProductRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ProductTable {
    type Item = &'a ProductRecord;
    type IntoIter = std::slice::Iter<'a, ProductRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
