use scanmatch_core::{Error, ProductRecord, ProductTable, Result};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use tracing::warn;

/// How strictly a table source is validated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Fail the load when two records share a normalized barcode. When unset
    /// the duplicates are logged and kept, and lookups resolve to the first.
    pub reject_duplicates: bool,
}

impl LoadOptions {
    pub fn strict() -> Self {
        Self {
            reject_duplicates: true,
        }
    }
}

/// Load a product table from a JSON file holding an array of records
pub fn load_table<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<ProductTable> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::TableLoad(format!("{} does not exist", path.display())),
        _ => Error::Io(e),
    })?;
    parse_table(&bytes, options)
}

/// Parse a product table from in-memory JSON
pub fn parse_table(bytes: &[u8], options: LoadOptions) -> Result<ProductTable> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| Error::Malformed(e.to_string()))?;

    let Value::Array(items) = value else {
        return Err(Error::Malformed(
            "expected a JSON array of product records".to_string(),
        ));
    };

    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(Error::Malformed(format!("record {} is not an object", index)));
            }
            serde_json::from_value::<ProductRecord>(item)
                .map_err(|e| Error::Malformed(format!("record {}: {}", index, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let table = ProductTable::new(records);
    check_duplicates(&table, options)?;
    Ok(table)
}

fn check_duplicates(table: &ProductTable, options: LoadOptions) -> Result<()> {
    for duplicate in table.duplicates() {
        if options.reject_duplicates {
            return Err(Error::DuplicateBarcode {
                barcode: duplicate.barcode,
                first: duplicate.first,
                second: duplicate.second,
            });
        }
        warn!(
            barcode = %duplicate.barcode,
            first = duplicate.first,
            second = duplicate.second,
            "duplicate barcode, later record is unreachable"
        );
    }
    Ok(())
}
