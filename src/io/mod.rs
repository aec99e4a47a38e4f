//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV record types, conversion and output serialization
//! - `seed` - Opening seeded accounts on the in-memory ledger
//! - `sync_reader` - Synchronous CSV reader with iterator interface
//! - `async_reader` - Asynchronous CSV reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod seed;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_operation_record, write_accounts_csv, write_history_csv, OperationCsvRecord,
    SeedCsvRecord,
};
pub use seed::{load_accounts, load_accounts_from};
pub use sync_reader::SyncReader;
