//! OFX statement parser.
//!
//! No schema validation: `<STMTTRN>` blocks are pulled out with a regex and
//! the interesting tags read per block. OFX is SGML-ish and banks rarely
//! close field tags, so values run until the next `<`.

use anyhow::{bail, Result};
use fintrack_core::{normalize, Transaction, TxKind};
use regex::Regex;

/// Parse OFX statement text. Blocks missing a date or description are
/// skipped; a file with no usable block at all is an error.
pub fn parse_ofx(text: &str) -> Result<Vec<Transaction>> {
    let block_re = Regex::new(r"(?is)<STMTTRN>.*?</STMTTRN>")?;

    let mut txns = Vec::new();

    for block in block_re.find_iter(text) {
        let block = block.as_str();
        let date_raw = ofx_field(block, "DTPOSTED");
        let description = ofx_field(block, "MEMO")
            .or_else(|| ofx_field(block, "NAME"))
            .unwrap_or_default();
        let amount_raw = ofx_field(block, "TRNAMT").unwrap_or_default();

        let Some(date_raw) = date_raw else { continue };
        if description.is_empty() {
            continue;
        }

        // TRNAMT uses dot decimals; the sign decides the direction.
        let signed: f64 = amount_raw.trim().parse().unwrap_or(0.0);

        txns.push(Transaction {
            date: normalize::parse_date(&date_raw),
            description,
            kind: if signed > 0.0 {
                TxKind::Income
            } else {
                TxKind::FixedExpense
            },
            amount: signed.abs(),
            balance: None,
        });
    }

    if txns.is_empty() {
        bail!("Nenhuma transação encontrada no arquivo OFX");
    }
    Ok(txns)
}

fn ofx_field(block: &str, tag: &str) -> Option<String> {
    let re = Regex::new(&format!(r"(?i)<{tag}>([^<\r\n]+)")).ok()?;
    let value = re.captures(block)?.get(1)?.as_str().trim().to_string();
    (!value.is_empty()).then_some(value)
}
