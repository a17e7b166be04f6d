//! # scanmatch
//!
//! Resolves a raw scan (barcode, QR payload or typed code) to exactly one
//! record of a small in-memory product table.
//!
//! A scan is rarely just the code: QR labels carry product URLs, some
//! scanners percent-encode their payload, others glue several fields
//! together. scanmatch extracts every plausible code from the raw string and
//! matches them case-insensitively against the table, reporting at most one
//! record.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! scanmatch --db ./db.json lookup "https://shop.example/p/7501234567890"
//! scanmatch --db ./db.json scan --device /dev/ttyACM0
//! scanmatch --db ./db.json serve --port 8080
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use scanmatch::prelude::*;
//!
//! let catalog = Catalog::from_table(ProductTable::new(vec![
//!     ProductRecord::new("7501234567890", "42", "Amarillo"),
//! ]));
//!
//! match catalog.lookup().resolve("7501234567890 ") {
//!     LookupOutcome::Found(record) => assert_eq!(record.display_value, "42"),
//!     other => panic!("unexpected outcome: {:?}", other),
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `scanmatch-core` - Product table, candidate extraction, matching, lookup
//! - `scanmatch-storage` - Loading the table from a JSON file
//! - `scanmatch-api` - Scan session, terminal presenter, REST endpoint

// Re-export core types
pub use scanmatch_core::{
    CandidateSet, Classifier, Error, Extractor, ExtractorConfig, Lookup, LookupOutcome,
    Matcher, ProductRecord, ProductTable, Result, TokenStyle,
};

// Re-export storage
pub use scanmatch_storage::{load_table, Catalog, CatalogState, LoadOptions};

// Re-export API
pub use scanmatch_api::{
    ApiState, Presenter, RestApi, ScanConfig, ScanError, ScanEvent, ScanSession, SensorSource,
    Status, StatusLevel, Symbology, TerminalPresenter,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Catalog, Extractor, ExtractorConfig, LoadOptions, Lookup, LookupOutcome, Presenter,
        ProductRecord, ProductTable, ScanConfig, ScanSession, SensorSource, Status,
        TerminalPresenter,
    };
}
