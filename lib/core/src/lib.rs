//! # scanmatch Core
//!
//! Core library for the scanmatch barcode lookup engine.
//!
//! This crate provides the data model and the decision logic:
//!
//! - [`ProductRecord`] - A catalog entry with its barcode, display token and classifier
//! - [`ProductTable`] - Ordered, read-only sequence of records
//! - [`Extractor`] - Turns a raw scan into a [`CandidateSet`]
//! - [`Matcher`] - Finds at most one record for a candidate set
//! - [`Lookup`] - Composes both into an invalid / not-found / found outcome
//!
//! ## Example
//!
//! ```rust
//! use scanmatch_core::{Lookup, LookupOutcome, ProductRecord, ProductTable};
//!
//! let table = ProductTable::new(vec![
//!     ProductRecord::new("7501234567890", "42", "Amarillo"),
//! ]);
//! let lookup = Lookup::new(&table);
//!
//! // A QR code pointing at the product page resolves to the same record
//! let outcome = lookup.resolve("https://shop.example/p/7501234567890?ref=qr");
//! assert_eq!(outcome.record().map(|r| r.display_value.as_str()), Some("42"));
//!
//! assert_eq!(lookup.resolve("   "), LookupOutcome::Invalid);
//! ```

pub mod candidate;
pub mod error;
pub mod extract;
pub mod lookup;
pub mod matcher;
pub mod record;
pub mod table;

pub use candidate::CandidateSet;
pub use error::{Error, Result};
pub use extract::{Extractor, ExtractorConfig};
pub use lookup::{Lookup, LookupOutcome};
pub use matcher::{normalize_code, Matcher};
pub use record::{Classifier, ProductRecord, TokenStyle};
pub use table::{DuplicateBarcode, ProductTable};
