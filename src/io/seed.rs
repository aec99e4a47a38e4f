//! Account seeding from CSV
//!
//! Opens the accounts listed in a seed file (`account,owner,currency`) on an
//! [`InMemoryLedger`]. Owners and currency symbols are registered on first
//! sight. Every account starts at a zero balance; money only enters through
//! deposits.
//!
//! Unlike operation streams, a bad seed row aborts the load: the operations
//! that follow would be replayed against the wrong set of accounts.

use crate::core::ledger_store::InMemoryLedger;
use crate::io::csv_format::SeedCsvRecord;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Open every account in the seed file
///
/// # Returns
///
/// * `Ok(usize)` - Number of accounts opened
/// * `Err(String)` - The file could not be read or a row was rejected
pub fn load_accounts(path: &Path, ledger: &InMemoryLedger) -> Result<usize, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;
    load_accounts_from(file, ledger)
}

/// Open every account in seed CSV read from `input`
pub fn load_accounts_from<R: Read>(input: R, ledger: &InMemoryLedger) -> Result<usize, String> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(input);

    let mut opened = 0;
    for (index, row) in reader.deserialize::<SeedCsvRecord>().enumerate() {
        // Header is line 1
        let line = index + 2;
        let record = row.map_err(|e| format!("Line {}: CSV parse error: {}", line, e))?;

        if record.currency.is_empty() {
            return Err(format!(
                "Line {}: account {} has no currency",
                line, record.account
            ));
        }

        ledger.ensure_user(record.owner, &format!("user{}", record.owner));
        let currency = ledger.register_currency(&record.currency);
        ledger
            .open_account_with_id(record.account, record.owner, currency)
            .map_err(|e| format!("Line {}: {}", line, e))?;
        opened += 1;
    }

    tracing::debug!(accounts = opened, "seed loaded");
    Ok(opened)
}
