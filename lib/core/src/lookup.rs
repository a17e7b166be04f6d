use crate::{Extractor, Matcher, ProductRecord, ProductTable};
use tracing::debug;

/// Result of resolving one raw input
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome<'t> {
    /// Nothing usable in the input
    Invalid,
    /// Candidates were found but none is in the table
    NotFound { attempted: String },
    Found(&'t ProductRecord),
}

impl<'t> LookupOutcome<'t> {
    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, LookupOutcome::Found(_))
    }

    #[inline]
    pub fn record(&self) -> Option<&'t ProductRecord> {
        match self {
            LookupOutcome::Found(record) => Some(*record),
            _ => None,
        }
    }

    /// The code reported as searched when nothing matched
    #[inline]
    pub fn attempted(&self) -> Option<&str> {
        match self {
            LookupOutcome::NotFound { attempted } => Some(attempted.as_str()),
            _ => None,
        }
    }
}

/// Composes extraction and matching against one table
#[derive(Debug, Clone)]
pub struct Lookup<'t> {
    table: &'t ProductTable,
    extractor: Extractor,
    matcher: Matcher,
}

impl<'t> Lookup<'t> {
    pub fn new(table: &'t ProductTable) -> Self {
        Self {
            table,
            extractor: Extractor::default(),
            matcher: Matcher::new(),
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    #[inline]
    pub fn table(&self) -> &'t ProductTable {
        self.table
    }

    pub fn resolve(&self, raw: &str) -> LookupOutcome<'t> {
        let candidates = self.extractor.extract(raw);
        let Some(attempted) = candidates.first() else {
            debug!("lookup rejected: no candidates in input");
            return LookupOutcome::Invalid;
        };

        match self.matcher.find(&candidates, self.table) {
            Some(record) => {
                debug!(barcode = %record.barcode, "lookup matched");
                LookupOutcome::Found(record)
            }
            None => {
                debug!(attempted, candidates = candidates.len(), "lookup missed");
                LookupOutcome::NotFound {
                    attempted: attempted.to_string(),
                }
            }
        }
    }
}
