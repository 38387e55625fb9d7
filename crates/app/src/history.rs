use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use cashlens_core::TransactionRecord;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row}: invalid date '{value}'")]
    InvalidDate { row: usize, value: String },
    #[error("Row {row}: invalid amount '{value}'")]
    InvalidAmount { row: usize, value: String },
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    date: String,
    #[serde(default)]
    description: String,
    amount: String,
}

/// Reads `date,description,amount` rows. The header row is required; the
/// description column may be empty.
pub fn read_history<R: Read>(data: R) -> Result<Vec<TransactionRecord>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<HistoryRow>().enumerate() {
        let row = row?;
        // Header is line 1.
        let line = idx + 2;
        let date = parse_date(&row.date).ok_or_else(|| ImportError::InvalidDate {
            row: line,
            value: row.date.clone(),
        })?;
        let amount = parse_amount(&row.amount).ok_or_else(|| ImportError::InvalidAmount {
            row: line,
            value: row.amount.clone(),
        })?;

        let mut record = TransactionRecord::new(date, amount);
        if !row.description.is_empty() {
            record = record.with_description(row.description);
        }
        records.push(record);
    }

    tracing::debug!(rows = records.len(), "Loaded transaction history");
    Ok(records)
}

pub fn read_history_file(path: &Path) -> Result<Vec<TransactionRecord>, ImportError> {
    let file = std::fs::File::open(path)?;
    read_history(std::io::BufReader::new(file))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%m-%d-%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Accepts `$`, thousands separators and accounting parentheses.
fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    let (negative, s) = match s.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, s),
    };
    let cleaned = s.replace([',', '$', ' '], "");
    let amount = Decimal::from_str(&cleaned).ok()?;
    Some(if negative { -amount } else { amount })
}
