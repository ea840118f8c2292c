//! CSV format handling for ledger commands, summaries and the journal
//!
//! This module centralizes all CSV format concerns:
//! - `CsvRecord` structure for deserialization
//! - Conversion from CSV records to `LedgerCommand`
//! - Account summary and journal serialization
//!
//! All functions are pure (no file I/O) for easy testing. Money crosses this
//! boundary as major-unit decimal text and is converted to minor units here.

use serde::Deserialize;
use std::io::Write;

use crate::types::{
    format_minor_units, parse_major_units, AccountId, AccountSummary, Amount, LedgerCommand,
    LedgerError, PayoutAction, PayoutMethod, Transaction, TransactionKind,
};

/// Raw CSV row
///
/// Columns: `type,account,amount,reference,method,destination,description`.
/// Everything after `account` is optional so short rows such as
/// `open,1` are accepted.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub command_type: String,
    pub account: AccountId,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Treat blank cells as absent
fn present(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(field: Option<String>, command: &str, column: &str) -> Result<String, LedgerError> {
    present(field)
        .ok_or_else(|| LedgerError::invalid_command(command, format!("missing {}", column)))
}

fn required_amount(field: Option<String>, command: &str) -> Result<Amount, LedgerError> {
    parse_major_units(&required(field, command, "amount")?)
}

/// Convert a CSV row into a ledger command
///
/// # Errors
///
/// `InvalidCommand` for an unknown type or a missing column, `InvalidAmount`
/// for an amount that is not a two-place decimal.
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<LedgerCommand, LedgerError> {
    let command_type = csv_record.command_type.trim().to_lowercase();
    let account = csv_record.account;

    let transition = |action: PayoutAction,
                      reference: Option<String>|
     -> Result<LedgerCommand, LedgerError> {
        Ok(LedgerCommand::Transition {
            account,
            key: required(reference, &command_type, "reference")?,
            action,
        })
    };

    match command_type.as_str() {
        "open" => Ok(LedgerCommand::Open { account }),
        "credit" | "adjust" => {
            let kind = if command_type == "credit" {
                TransactionKind::SaleCredit
            } else {
                TransactionKind::Adjustment
            };
            let amount = required_amount(csv_record.amount, &command_type)?;
            let reference = present(csv_record.reference);
            let description = present(csv_record.description).unwrap_or_else(|| {
                match (&kind, &reference) {
                    (TransactionKind::SaleCredit, Some(order)) => {
                        format!("Sale credit for {}", order)
                    }
                    (TransactionKind::SaleCredit, None) => "Sale credit".to_string(),
                    _ => "Manual adjustment".to_string(),
                }
            });
            Ok(LedgerCommand::Credit {
                account,
                amount,
                kind,
                description,
                reference,
            })
        }
        "payout" => {
            let amount = required_amount(csv_record.amount, &command_type)?;
            let method = required(csv_record.method, &command_type, "method")?
                .parse::<PayoutMethod>()
                .map_err(|reason| LedgerError::invalid_command(&command_type, reason))?;
            let destination = required(csv_record.destination, &command_type, "destination")?;
            Ok(LedgerCommand::Payout {
                account,
                amount,
                method,
                destination,
                key: present(csv_record.reference),
            })
        }
        "approve" => transition(PayoutAction::Approve, csv_record.reference),
        "reject" => transition(PayoutAction::Reject, csv_record.reference),
        "paid" => transition(PayoutAction::MarkPaid, csv_record.reference),
        _ => Err(LedgerError::invalid_command(
            &csv_record.command_type,
            "unknown command type",
        )),
    }
}

/// Write account summaries as CSV, sorted by account id
pub fn write_accounts_csv(
    summaries: &[AccountSummary],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["account", "balance", "reserved", "transactions", "reconciled"])?;

    let mut sorted = summaries.to_vec();
    sorted.sort_by_key(|summary| summary.account);

    for summary in sorted {
        writer.write_record(&[
            summary.account.to_string(),
            format_minor_units(summary.balance),
            format_minor_units(summary.reserved),
            summary.transactions.to_string(),
            summary.reconciled.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the transaction journal as CSV, in the given order
pub fn write_journal_csv(
    transactions: &[Transaction],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record([
        "id",
        "account",
        "kind",
        "amount",
        "reference",
        "created_at",
        "description",
    ])?;

    for transaction in transactions {
        writer.write_record(&[
            transaction.id.to_string(),
            transaction.account_id.to_string(),
            transaction.kind.as_str().to_string(),
            format_minor_units(transaction.amount),
            transaction.reference_id.clone().unwrap_or_default(),
            transaction.created_at.to_rfc3339(),
            transaction.description.clone(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
