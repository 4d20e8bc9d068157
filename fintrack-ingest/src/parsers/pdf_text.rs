//! Extracted-PDF-text statement parser.
//!
//! PDF extraction itself is a black box upstream; this parser receives the
//! raw page text and scans it line by line. A line with a date-like token
//! anchors a candidate transaction; the currency value may sit on the same
//! line or spill onto the next two.

use anyhow::{bail, Result};
use fintrack_core::{normalize, Transaction, TxKind};
use regex::Regex;

const MAX_DESCRIPTION: usize = 100;

/// Parse statement text extracted from a PDF. Lines that never resolve to a
/// date + value pair are ignored; zero resolved lines is an error.
pub fn parse_pdf_text(text: &str) -> Result<Vec<Transaction>> {
    let date_re = Regex::new(r"(\d{1,2})[/\-](\d{1,2})[/\-](\d{2,4})")?;
    let money_re = Regex::new(r"(?i)R\$?\s*([\d.,]+)")?;

    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut txns = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let Some(date_match) = date_re.find(line) else {
            continue;
        };

        // value on this line or within the next two
        let window = lines[i..lines.len().min(i + 3)].join(" ");
        let Some(money) = money_re.captures(&window) else {
            continue;
        };
        let Some(value_token) = money.get(1) else {
            continue;
        };

        let remainder = &line[date_match.end()..];
        let description: String = money_re
            .replace_all(remainder, "")
            .trim()
            .chars()
            .take(MAX_DESCRIPTION)
            .collect();
        if description.is_empty() {
            continue;
        }

        let lowered = line.to_lowercase();
        let kind = if lowered.contains("entrada")
            || lowered.contains("crédito")
            || lowered.contains("credito")
        {
            TxKind::Income
        } else {
            TxKind::FixedExpense
        };

        let value = normalize::parse_amount(value_token.as_str());

        txns.push(Transaction {
            date: normalize::parse_date(date_match.as_str()),
            description,
            kind,
            amount: value.abs(),
            balance: None,
        });
    }

    if txns.is_empty() {
        bail!("Nenhuma transação encontrada no extrato PDF");
    }
    Ok(txns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
Extrato de Conta Corrente
05/01/2025 Pagamento boleto energia R$ 230,45
06/01/2025 Entrada transferência recebida R$ 1.500,00
07/01/2025 Compra cartão final 1234
R$ 89,90
texto sem data nem valor
08/01/2025 linha sem valor por perto
sem valor aqui
e aqui tambem";

    #[test]
    fn test_same_line_value() {
        let txns = parse_pdf_text(SAMPLE).unwrap();
        assert_eq!(txns[0].date, NaiveDate::from_ymd_opt(2025, 1, 5));
        assert_eq!(txns[0].description, "Pagamento boleto energia");
        assert_eq!(txns[0].amount, 230.45);
        assert_eq!(txns[0].kind, TxKind::FixedExpense);
    }

    #[test]
    fn test_entrada_line_is_income() {
        let txns = parse_pdf_text(SAMPLE).unwrap();
        assert_eq!(txns[1].kind, TxKind::Income);
        assert_eq!(txns[1].amount, 1500.0);
    }

    #[test]
    fn test_value_on_following_line() {
        let txns = parse_pdf_text(SAMPLE).unwrap();
        let card = &txns[2];
        assert_eq!(card.date, NaiveDate::from_ymd_opt(2025, 1, 7));
        assert_eq!(card.amount, 89.9);
        assert!(card.description.contains("Compra cartão"));
    }

    #[test]
    fn test_dateless_or_valueless_lines_skipped() {
        let txns = parse_pdf_text(SAMPLE).unwrap();
        assert_eq!(txns.len(), 3);
    }

    #[test]
    fn test_description_is_truncated() {
        let long = format!("05/01/2025 {} R$ 10,00", "x".repeat(300));
        let txns = parse_pdf_text(&long).unwrap();
        assert_eq!(txns[0].description.chars().count(), 100);
    }

    #[test]
    fn test_no_transactions_is_an_error() {
        assert!(parse_pdf_text("apenas texto corrido\nsem nada").is_err());
    }
}
