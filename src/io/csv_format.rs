//! CSV format handling for operations, account seeds and output
//!
//! This module centralizes all CSV format concerns, providing:
//! - Record structures for deserialization (operations and seeded accounts)
//! - Conversion from CSV records to domain types
//! - Balance and history output serialization
//!
//! Conversions are pure; the writers only touch the writer they are given.

use crate::core::traits::AccountDirectory;
use crate::types::{
    Account, AccountId, CurrencyId, HistoryEntry, OperationRecord, OperationRequest, UserId,
};
use csv::Writer;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Write;

/// Operation CSV row: `type,user,from,to,amount`
///
/// `from` and `to` are optional because deposits have no source and
/// withdrawals no destination. The amount is kept as text so that zero,
/// negative and malformed values can be told apart.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OperationCsvRecord {
    #[serde(rename = "type")]
    pub op_type: String,
    pub user: UserId,
    pub from: Option<AccountId>,
    pub to: Option<AccountId>,
    pub amount: Option<String>,
}

/// Seed CSV row: `account,owner,currency`
///
/// `currency` is a symbol such as `USD`; IDs are assigned on load.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SeedCsvRecord {
    pub account: AccountId,
    pub owner: UserId,
    pub currency: String,
}

/// Convert an OperationCsvRecord to an OperationRecord
///
/// Checks that the legs present match the operation type. Amount sign is
/// not checked here; the engine rejects non-positive amounts itself.
///
/// # Returns
///
/// * `Ok(OperationRecord)` - Successfully converted record
/// * `Err(String)` - Why the row cannot form a request
pub fn convert_operation_record(csv_record: OperationCsvRecord) -> Result<OperationRecord, String> {
    let amount = match csv_record.amount.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text
            .parse::<i64>()
            .map_err(|_| format!("Invalid amount '{}' for user {}", text, csv_record.user))?,
        _ => {
            return Err(format!(
                "{} for user {} requires an amount",
                csv_record.op_type, csv_record.user
            ))
        }
    };

    let request = match (
        csv_record.op_type.to_lowercase().as_str(),
        csv_record.from,
        csv_record.to,
    ) {
        ("deposit", None, Some(to)) => OperationRequest::deposit(to, amount),
        ("withdraw" | "withdrawal", Some(from), None) => OperationRequest::withdraw(from, amount),
        ("transfer", Some(from), Some(to)) => OperationRequest::transfer(from, to, amount),
        ("deposit", _, _) => {
            return Err(format!(
                "deposit for user {} needs a destination and no source",
                csv_record.user
            ))
        }
        ("withdraw" | "withdrawal", _, _) => {
            return Err(format!(
                "withdraw for user {} needs a source and no destination",
                csv_record.user
            ))
        }
        ("transfer", _, _) => {
            return Err(format!(
                "transfer for user {} needs both a source and a destination",
                csv_record.user
            ))
        }
        _ => {
            return Err(format!(
                "Invalid operation type: '{}' for user {}",
                csv_record.op_type, csv_record.user
            ))
        }
    };

    Ok(OperationRecord {
        user: csv_record.user,
        request,
    })
}

/// Write account balances to CSV format
///
/// Columns: account, owner, currency, balance. Accounts are sorted by ID
/// for deterministic output and currencies are written as symbols.
///
/// # Arguments
///
/// * `accounts` - Account snapshots to write
/// * `directory` - Resolves currency IDs to symbols
/// * `output` - Writer receiving the CSV
pub fn write_accounts_csv(
    accounts: &[Account],
    directory: &dyn AccountDirectory,
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "owner", "currency", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by_key(|account| account.id);

    let mut symbols: HashMap<CurrencyId, String> = HashMap::new();
    for account in sorted_accounts {
        let symbol = match symbols.get(&account.currency) {
            Some(symbol) => symbol.clone(),
            None => {
                let symbol = directory
                    .currency_symbol(account.currency)
                    .map_err(|e| format!("Failed to resolve currency: {}", e))?;
                symbols.insert(account.currency, symbol.clone());
                symbol
            }
        };

        writer
            .write_record(&[
                account.id.to_string(),
                account.owner.to_string(),
                symbol,
                account.balance.to_string(),
            ])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write a history listing to CSV format
///
/// Columns: entry, kind, from, to, currency, amount. Missing legs are empty
/// fields. Entries are written in the order given.
pub fn write_history_csv(history: &[HistoryEntry], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["entry", "kind", "from", "to", "currency", "amount"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for entry in history {
        writer
            .write_record(&[
                entry.entry_id.to_string(),
                entry.kind.to_string(),
                entry.from.map(|id| id.to_string()).unwrap_or_default(),
                entry.to.map(|id| id.to_string()).unwrap_or_default(),
                entry.currency_symbol.clone(),
                entry.amount.to_string(),
            ])
            .map_err(|e| format!("Failed to write history record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger_store::InMemoryLedger;
    use crate::types::{Operation, OperationKind};
    use chrono::Utc;
    use rstest::rstest;

    fn record(
        op_type: &str,
        from: Option<AccountId>,
        to: Option<AccountId>,
        amount: Option<&str>,
    ) -> OperationCsvRecord {
        OperationCsvRecord {
            op_type: op_type.to_string(),
            user: 7,
            from,
            to,
            amount: amount.map(|s| s.to_string()),
        }
    }

    #[rstest]
    #[case::deposit("deposit", None, Some(2), Operation::Deposit { to: 2 })]
    #[case::withdraw("withdraw", Some(1), None, Operation::Withdraw { from: 1 })]
    #[case::withdrawal_alias("withdrawal", Some(1), None, Operation::Withdraw { from: 1 })]
    #[case::transfer("transfer", Some(1), Some(2), Operation::Transfer { from: 1, to: 2 })]
    #[case::case_insensitive("DEPOSIT", None, Some(2), Operation::Deposit { to: 2 })]
    fn test_convert_operation_record_valid(
        #[case] op_type: &str,
        #[case] from: Option<AccountId>,
        #[case] to: Option<AccountId>,
        #[case] expected: Operation,
    ) {
        let converted = convert_operation_record(record(op_type, from, to, Some("100"))).unwrap();

        assert_eq!(converted.user, 7);
        assert_eq!(converted.request.operation, expected);
        assert_eq!(converted.request.amount, 100);
    }

    #[rstest]
    #[case::zero(" 0 ", 0)]
    #[case::negative("-5", -5)]
    #[case::padded("  42  ", 42)]
    fn test_convert_operation_record_keeps_amount_sign(#[case] amount: &str, #[case] expected: i64) {
        let converted = convert_operation_record(record("deposit", None, Some(1), Some(amount)));

        assert_eq!(converted.unwrap().request.amount, expected);
    }

    #[rstest]
    #[case::invalid_type("refund", None, Some(1), Some("1"), "Invalid operation type")]
    #[case::missing_amount("deposit", None, Some(1), None, "requires an amount")]
    #[case::blank_amount("deposit", None, Some(1), Some("  "), "requires an amount")]
    #[case::fractional_amount("deposit", None, Some(1), Some("1.5"), "Invalid amount")]
    #[case::text_amount("deposit", None, Some(1), Some("ten"), "Invalid amount")]
    #[case::deposit_with_source("deposit", Some(1), Some(2), Some("1"), "needs a destination")]
    #[case::deposit_without_destination("deposit", None, None, Some("1"), "needs a destination")]
    #[case::withdraw_with_destination("withdraw", Some(1), Some(2), Some("1"), "needs a source")]
    #[case::transfer_missing_leg("transfer", Some(1), None, Some("1"), "needs both")]
    fn test_convert_operation_record_errors(
        #[case] op_type: &str,
        #[case] from: Option<AccountId>,
        #[case] to: Option<AccountId>,
        #[case] amount: Option<&str>,
        #[case] expected_error: &str,
    ) {
        let result = convert_operation_record(record(op_type, from, to, amount));

        assert!(result.unwrap_err().contains(expected_error));
    }

    #[test]
    fn test_write_accounts_csv_sorted_with_symbols() {
        let ledger = InMemoryLedger::new();
        let usd = ledger.register_currency("USD");
        let eur = ledger.register_currency("EUR");
        let accounts = vec![
            Account {
                id: 3,
                owner: 2,
                currency: eur,
                balance: 0,
            },
            Account {
                id: 1,
                owner: 1,
                currency: usd,
                balance: 150,
            },
        ];
        let mut output = Vec::new();

        write_accounts_csv(&accounts, &ledger, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account,owner,currency,balance\n1,1,USD,150\n3,2,EUR,0\n"
        );
    }

    #[test]
    fn test_write_accounts_csv_empty() {
        let ledger = InMemoryLedger::new();
        let mut output = Vec::new();

        write_accounts_csv(&[], &ledger, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account,owner,currency,balance\n"
        );
    }

    #[test]
    fn test_write_accounts_csv_unknown_currency() {
        let ledger = InMemoryLedger::new();
        let accounts = vec![Account::new(1, 1, 99)];
        let mut output = Vec::new();

        let result = write_accounts_csv(&accounts, &ledger, &mut output);

        assert!(result.unwrap_err().contains("Failed to resolve currency"));
    }

    #[test]
    fn test_write_history_csv_leaves_missing_legs_empty() {
        let entry = |entry_id, kind, from, to| HistoryEntry {
            entry_id,
            kind,
            from,
            to,
            currency_symbol: "USD".to_string(),
            amount: 10,
            timestamp: Utc::now(),
        };
        let history = vec![
            entry(1, OperationKind::Deposit, None, Some(1)),
            entry(2, OperationKind::Withdraw, Some(1), None),
            entry(3, OperationKind::Transfer, Some(1), Some(2)),
        ];
        let mut output = Vec::new();

        write_history_csv(&history, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "entry,kind,from,to,currency,amount\n\
             1,deposit,,1,USD,10\n\
             2,withdraw,1,,USD,10\n\
             3,transfer,1,2,USD,10\n"
        );
    }
}
