//! Bank CSV statement parser.
//!
//! Brazilian bank CSV exports differ in header wording but agree on column
//! order, so the first line is skipped as a header (not validated) and data
//! rows are read positionally: date, description, amount, balance.

use anyhow::{bail, Result};
use csv::ReaderBuilder;
use fintrack_core::{detect_csv_kind, normalize, Transaction};

/// Parse CSV statement text. Malformed rows are skipped silently; only a
/// file that yields zero transactions is an error.
pub fn parse_csv(text: &str) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(text.trim().as_bytes());

    let mut txns = Vec::new();

    for (row, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(_) => continue,
        };
        if row == 0 {
            // header row
            continue;
        }

        let date = normalize::parse_date(record.get(0).unwrap_or(""));
        let description = record.get(1).unwrap_or("").trim_matches('"').to_string();
        let signed = normalize::parse_amount(record.get(2).unwrap_or(""));
        let balance = record
            .get(3)
            .map(normalize::parse_amount)
            .filter(|b| *b != 0.0);

        if date.is_none() || description.is_empty() {
            continue;
        }

        txns.push(Transaction {
            date,
            kind: detect_csv_kind(&description, signed),
            description,
            amount: signed.abs(),
            balance,
        });
    }

    if txns.is_empty() {
        bail!("Nenhuma transação encontrada no arquivo CSV");
    }
    Ok(txns)
}
