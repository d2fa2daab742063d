#![deny(unsafe_code)]

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{IngestError, Result};
pub use reader::{
    read_column, read_patients, read_typed, resolve_table_path,
};
pub use writer::write_records;
