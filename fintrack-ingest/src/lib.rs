//! fintrack-ingest: heuristic bank-statement ingestion (CSV, OFX and
//! extracted PDF text) into the normalized transaction model.

pub mod parsers;

use anyhow::Result;
use fintrack_core::Transaction;

pub use parsers::{parse_csv, parse_ofx, parse_pdf_text};

/// Supported statement sources. PDF is "pdf text": the byte-to-text
/// extraction happens upstream and this crate only sees page text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementFormat {
    Csv,
    Ofx,
    PdfText,
}

impl StatementFormat {
    /// Guess the format from a file name; defaults to CSV.
    pub fn from_extension(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.ends_with(".ofx") {
            StatementFormat::Ofx
        } else if lower.ends_with(".pdf") || lower.ends_with(".txt") {
            StatementFormat::PdfText
        } else {
            StatementFormat::Csv
        }
    }
}

/// Parse statement text in the given format.
pub fn parse_statement(format: StatementFormat, text: &str) -> Result<Vec<Transaction>> {
    match format {
        StatementFormat::Csv => parse_csv(text),
        StatementFormat::Ofx => parse_ofx(text),
        StatementFormat::PdfText => parse_pdf_text(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(StatementFormat::from_extension("extrato.OFX"), StatementFormat::Ofx);
        assert_eq!(StatementFormat::from_extension("extrato.pdf"), StatementFormat::PdfText);
        assert_eq!(StatementFormat::from_extension("extrato.csv"), StatementFormat::Csv);
        assert_eq!(StatementFormat::from_extension("sem-extensao"), StatementFormat::Csv);
    }
}
