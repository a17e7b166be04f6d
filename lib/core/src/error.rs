use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Product table could not be loaded: {0}")]
    TableLoad(String),

    #[error("Malformed product table: {0}")]
    Malformed(String),

    #[error("Duplicate barcode in product table: {barcode} (records {first} and {second})")]
    DuplicateBarcode {
        barcode: String,
        first: usize,
        second: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
