use crate::loader::{load_table, LoadOptions};
use scanmatch_core::{Lookup, ProductTable};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Whether the product table could be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogState {
    Loaded { records: usize },
    Unavailable { reason: String },
}

/// The loaded product table, or the reason it is missing.
///
/// An unavailable catalog still serves lookups against an empty table, so
/// every well-formed lookup reports "not found" instead of failing.
#[derive(Debug, Clone)]
pub struct Catalog {
    table: Arc<ProductTable>,
    state: CatalogState,
}

impl Catalog {
    /// Load the table at `path`. Never fails; load errors become
    /// [`CatalogState::Unavailable`].
    pub fn open<P: AsRef<Path>>(path: P, options: LoadOptions) -> Self {
        let path = path.as_ref();
        match load_table(path, options) {
            Ok(table) => {
                info!("Product table loaded from {:?}: {} records", path, table.len());
                Self::from_table(table)
            }
            Err(e) => {
                error!("Product table unavailable ({:?}): {}", path, e);
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn from_table(table: ProductTable) -> Self {
        let records = table.len();
        Self {
            table: Arc::new(table),
            state: CatalogState::Loaded { records },
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            table: Arc::new(ProductTable::empty()),
            state: CatalogState::Unavailable {
                reason: reason.into(),
            },
        }
    }

    #[inline]
    pub fn table(&self) -> &ProductTable {
        &self.table
    }

    /// Shared handle for lookups running on other threads
    #[inline]
    pub fn shared_table(&self) -> Arc<ProductTable> {
        self.table.clone()
    }

    #[inline]
    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    #[inline]
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self.state, CatalogState::Loaded { .. })
    }

    pub fn lookup(&self) -> Lookup<'_> {
        Lookup::new(&self.table)
    }

    /// One-line description for status displays
    pub fn describe(&self) -> String {
        match &self.state {
            CatalogState::Loaded { records } => {
                format!("Product table loaded ({} records).", records)
            }
            CatalogState::Unavailable { reason } => {
                format!("Could not load the product table: {}", reason)
            }
        }
    }
}
