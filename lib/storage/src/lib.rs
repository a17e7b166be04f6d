pub mod catalog;
pub mod loader;

pub use catalog::{Catalog, CatalogState};
pub use loader::{load_table, parse_table, LoadOptions};
