//! Normalized transaction model shared by statement ingestion, the bulk-log
//! parser and the chat engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::normalize::strip_accents;

/// Direction/nature of a transaction. Amounts are always stored as positive
/// magnitudes; the sign of the money flow is carried here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    #[serde(rename = "entrada")]
    Income,
    #[serde(rename = "saida_fixa")]
    FixedExpense,
    #[serde(rename = "diario")]
    DailyExpense,
}

impl TxKind {
    pub fn is_income(&self) -> bool {
        matches!(self, TxKind::Income)
    }

    /// Human-facing pt-BR label used in chat messages.
    pub fn label(&self) -> &'static str {
        match self {
            TxKind::Income => "entrada",
            TxKind::FixedExpense => "saída fixa",
            TxKind::DailyExpense => "gasto diário",
        }
    }
}

/// One normalized transaction, whatever the source format was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// `None` means the source did not carry a recognizable date.
    pub date: Option<NaiveDate>,
    pub description: String,
    pub kind: TxKind,
    /// Positive magnitude.
    pub amount: f64,
    /// Running balance when the source statement provides one.
    pub balance: Option<f64>,
}

impl Transaction {
    pub fn new(description: impl Into<String>, kind: TxKind, amount: f64) -> Self {
        Self {
            date: None,
            description: description.into(),
            kind,
            amount: amount.abs(),
            balance: None,
        }
    }
}

/// A transaction after the external classifier has seen it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category: String,
    /// Classifier confidence, 0–100.
    pub confidence: f64,
}

/// Output of the bulk-log parser: declared balances plus the leaf
/// transactions. Lines that only group children contribute no amount.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFinancialLog {
    pub opening_balance: Option<f64>,
    pub closing_balance: Option<f64>,
    pub transactions: Vec<Transaction>,
}

const INCOME_KEYWORDS: &[&str] = &[
    "salario",
    "deposito",
    "transferencia recebida",
    "pagamento recebido",
    "pix recebido",
    "rendimento",
    "reembolso",
    "estorno",
    "credito",
];

/// Income-keyword match over the description, otherwise a fixed expense.
/// This is the shared fallback for sources that carry no explicit sign.
pub fn infer_kind(description: &str) -> TxKind {
    let desc = strip_accents(&description.to_lowercase());
    if INCOME_KEYWORDS.iter().any(|k| desc.contains(k)) {
        TxKind::Income
    } else {
        TxKind::FixedExpense
    }
}

/// CSV rows carry a signed amount column, which lets us be a bit smarter:
/// recurring-bill keywords map to fixed expenses, debit/purchase keywords to
/// daily spending.
pub fn detect_csv_kind(description: &str, signed_amount: f64) -> TxKind {
    let desc = strip_accents(&description.to_lowercase());

    if signed_amount > 0.0 {
        return TxKind::Income;
    }
    if ["salario", "pagamento recebido", "deposito"]
        .iter()
        .any(|k| desc.contains(k))
    {
        return TxKind::Income;
    }
    if ["aluguel", "luz", "agua", "internet", "energia", "condominio"]
        .iter()
        .any(|k| desc.contains(k))
    {
        return TxKind::FixedExpense;
    }
    if ["pix", "transferencia"].iter().any(|k| desc.contains(k)) {
        return TxKind::FixedExpense;
    }
    if ["debito", "compra"].iter().any(|k| desc.contains(k)) {
        return TxKind::DailyExpense;
    }
    TxKind::FixedExpense
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_kind_income_keywords() {
        assert_eq!(infer_kind("Salário de março"), TxKind::Income);
        assert_eq!(infer_kind("Depósito em conta"), TxKind::Income);
        assert_eq!(infer_kind("Mercado central"), TxKind::FixedExpense);
    }

    #[test]
    fn test_detect_csv_kind_by_sign_and_keywords() {
        assert_eq!(detect_csv_kind("qualquer", 120.0), TxKind::Income);
        assert_eq!(detect_csv_kind("Aluguel apto", -900.0), TxKind::FixedExpense);
        assert_eq!(detect_csv_kind("Compra débito padaria", -12.5), TxKind::DailyExpense);
        assert_eq!(detect_csv_kind("PIX João", -40.0), TxKind::FixedExpense);
        assert_eq!(detect_csv_kind("sem pista", -10.0), TxKind::FixedExpense);
    }

    #[test]
    fn test_transaction_new_stores_magnitude() {
        let tx = Transaction::new("Uber", TxKind::DailyExpense, -23.5);
        assert_eq!(tx.amount, 23.5);
        assert!(tx.date.is_none());
    }

    #[test]
    fn test_tx_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&TxKind::FixedExpense).unwrap(),
            "\"saida_fixa\""
        );
        let kind: TxKind = serde_json::from_str("\"diario\"").unwrap();
        assert_eq!(kind, TxKind::DailyExpense);
    }
}
